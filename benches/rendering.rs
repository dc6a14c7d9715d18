//! Benchmarks for explanation rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use probedit::render::{ExplanationFormat, render_html, render_lines};

fn sample_explanation() -> String {
    let mut md = String::from("# Matrix times vector\n\n");
    for i in 0..40 {
        md.push_str(&format!(
            "Row {i} contributes $y_{{{i}}} = \\sum_j a_{{{i}j}} x_j$ to the **result**.\n\n"
        ));
    }
    md.push_str("$$\\frac{\\partial L}{\\partial w} = X^T (Xw - y)$$\n\n");
    md.push_str("```python\nimport numpy as np\nprint(np.dot(a, b))\n```\n\n");
    md.push_str("| n | cost |\n|---|------|\n| 1 | O(n) |\n| 2 | O(n^2) |\n");
    md
}

fn bench_render_html(c: &mut Criterion) {
    let md = sample_explanation();
    c.bench_function("render_html", |b| {
        b.iter(|| render_html(black_box(&md), ExplanationFormat::Markdown));
    });
}

fn bench_render_lines(c: &mut Criterion) {
    let md = sample_explanation();
    c.bench_function("render_lines_80", |b| {
        b.iter(|| render_lines(black_box(&md), ExplanationFormat::Markdown, black_box(80)));
    });
}

criterion_group!(benches, bench_render_html, bench_render_lines);
criterion_main!(benches);
