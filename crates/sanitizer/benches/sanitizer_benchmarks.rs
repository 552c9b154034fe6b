use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pixelpage_sanitizer::CssSanitizer;

fn sanitize_profile_stylesheet(c: &mut Criterion) {
    let sanitizer = CssSanitizer::default();

    let css = r#"
        body { background-color: #0b0b2b; color: #e0e0ff; font-family: "Comic Sans MS", cursive; }
        .profile-header, .profile-footer { border: 2px dashed hotpink; padding: 12px; }
        .friends li:hover { transform: scale(1.1); transition: transform 0.2s ease-in; }
        .blinkie { background-image: url(https://example.com/blinkie.gif); width: 150px; height: 20px; }
        @media (max-width: 600px) {
            .profile-header { font-size: 14px; }
            .friends { display: none; }
        }
        @keyframes glow {
            from { text-shadow: 0 0 2px #fff; }
            to { text-shadow: 0 0 12px #f0f; }
        }
    "#;

    c.bench_function("sanitize_profile_stylesheet", |b| {
        b.iter(|| sanitizer.sanitize(black_box(css), black_box("johndoe")))
    });
}

fn sanitize_hostile_stylesheet(c: &mut Criterion) {
    let sanitizer = CssSanitizer::default();

    let css = r#"
        @import url("https://evil.example/steal.css");
        body { background: url(javascript:alert(1)); behavior: url(x.htc); }
        div { width: expression(alert(document.cookie)); -moz-binding: url(x.xml#xss); }
        a { background-image: url("data:text/html,<script>alert(1)</script>"); }
        </style><script>alert('xss')</script>
        p { color: red; onmouseover: alert(1); content: "x"; }
    "#;

    c.bench_function("sanitize_hostile_stylesheet", |b| {
        b.iter(|| sanitizer.sanitize(black_box(css), black_box("johndoe")))
    });
}

fn sanitize_many_rules(c: &mut Criterion) {
    let sanitizer = CssSanitizer::default();
    let css: String = (0..1200)
        .map(|i| format!(".item{} {{ color: #{:06x}; margin: {}px; }}\n", i, i * 97, i % 16))
        .collect();

    c.bench_function("sanitize_many_rules", |b| {
        b.iter(|| sanitizer.sanitize(black_box(&css), black_box("johndoe")))
    });
}

fn validate_stylesheet(c: &mut Criterion) {
    let sanitizer = CssSanitizer::default();
    let css = "body { color: red; } .a { background: url(/img/a.png) } ".repeat(200);

    c.bench_function("validate_stylesheet", |b| {
        b.iter(|| sanitizer.validate(black_box(&css)))
    });
}

criterion_group!(
    benches,
    sanitize_profile_stylesheet,
    sanitize_hostile_stylesheet,
    sanitize_many_rules,
    validate_stylesheet
);
criterion_main!(benches);
