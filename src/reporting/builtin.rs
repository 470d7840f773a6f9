// ABOUTME: Built-in report templates compiled into the binary
// ABOUTME: Provides the default AI tool risk assessment theme and its partials

/// Top-level report templates
pub const TEMPLATES: &[(&str, &str)] = &[("assessment", ASSESSMENT), ("summary", SUMMARY)];

/// Partials used by the built-in templates, registered under these names
pub const PARTIALS: &[(&str, &str)] = &[
    ("assessment/styles", STYLES),
    ("assessment/header", HEADER),
    ("assessment/scores", SCORES),
    ("assessment/findings", FINDINGS),
    ("assessment/recommendations", RECOMMENDATIONS),
    ("assessment/footer", FOOTER),
];

pub fn template(name: &str) -> Option<&'static str> {
    TEMPLATES
        .iter()
        .chain(PARTIALS.iter())
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, content)| *content)
}

const ASSESSMENT: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{report.title}}</title>
{{> assessment/styles}}
</head>
<body>
{{> assessment/header}}
<main>
{{> assessment/scores}}
{{> assessment/findings}}
{{> assessment/recommendations}}
</main>
{{> assessment/footer}}
</body>
</html>
"##;

const SUMMARY: &str = r##"{{!-- one-paragraph summary used in notification emails --}}
<p><strong>{{tool.name}}</strong> was assessed as <span class="{{riskClass overall_score}}">{{riskLevel overall_score}} risk</span> ({{formatNumber overall_score}}/100){{#if assessed_at}} on {{formatDate assessed_at 'long'}}{{/if}}.{{#if findings}} {{length findings}} finding(s) recorded.{{/if}}</p>
"##;

const STYLES: &str = r##"<style>
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 60rem; color: #1f2933; }
header { border-bottom: 2px solid #cbd2d9; margin-bottom: 1.5rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #e4e7eb; padding: 0.4rem 0.6rem; text-align: left; }
.risk-low { color: #2f8132; }
.risk-medium { color: #b88700; }
.risk-high { color: #c65d07; }
.risk-critical { color: #ba2525; font-weight: bold; }
footer { margin-top: 2rem; font-size: 0.8rem; color: #7b8794; }
</style>"##;

const HEADER: &str = r##"<header>
<h1>{{report.title}}</h1>
<p>{{tool.name}}{{#if tool.vendor}} by {{tool.vendor}}{{/if}}{{#if tool.version}} (version {{tool.version}}){{/if}}</p>
<p>Overall risk: <strong class="{{riskClass overall_score}}">{{riskLevel overall_score}}</strong> ({{formatNumber overall_score}}/100)</p>
{{#if assessor}}<p>Assessed by {{assessor}}{{#if assessed_at}} on {{formatDate assessed_at 'long'}}{{/if}}</p>{{/if}}
</header>"##;

const SCORES: &str = r##"{{#if categories}}<section>
<h2>Category scores</h2>
<table>
<tr><th>Category</th><th>Score</th><th>Level</th><th>Notes</th></tr>
{{#each categories}}<tr><td>{{name}}</td><td>{{formatNumber score}}</td><td class="{{riskClass score}}">{{riskLevel score}}</td><td>{{default notes '-'}}</td></tr>
{{/each}}</table>
</section>{{/if}}"##;

const FINDINGS: &str = r##"<section>
<h2>Findings</h2>
{{#if findings}}<ol>
{{#each findings}}<li><strong>{{title}}</strong> <em>({{capitalize severity}})</em>{{#if description}}: {{description}}{{/if}}</li>
{{/each}}</ol>{{#else}}<p>No findings recorded.</p>{{/if}}
</section>"##;

const RECOMMENDATIONS: &str = r##"{{#if recommendations}}<section>
<h2>Recommendations</h2>
<ul>
{{#each recommendations}}<li>{{this}}</li>
{{/each}}</ul>
</section>{{/if}}"##;

const FOOTER: &str = r##"<footer>
{{#if compliance}}<p>Frameworks reviewed: {{join compliance ', '}}</p>{{/if}}
<p>Generated {{formatDate report.generated_at 'datetime'}} UTC from template {{report.template}}</p>
</footer>"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Severity, TemplateProcessor};

    #[test]
    fn test_lookup() {
        assert!(template("assessment").is_some());
        assert!(template("assessment/footer").is_some());
        assert!(template("missing").is_none());
    }

    #[test]
    fn test_builtin_templates_lint_clean() {
        let mut processor = TemplateProcessor::new().unwrap();
        for (name, content) in PARTIALS {
            processor.register_partial(name, content);
        }
        for (name, content) in TEMPLATES.iter().chain(PARTIALS.iter()) {
            let problems: Vec<_> = processor
                .lint(content)
                .into_iter()
                .filter(|d| d.severity == Severity::Error || d.message.contains("helper"))
                .collect();
            assert!(problems.is_empty(), "{}: {:?}", name, problems);
        }
    }
}
