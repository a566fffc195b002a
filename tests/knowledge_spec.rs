use std::fs;
use std::path::Path;

use almostme::knowledge::{ContextPolicy, Knowledge, DEFAULT_SYSTEM_PROMPT, KNOWLEDGE_HEADER};
use almostme::models::Domain;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("Failed to write fixture");
}

fn fixture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = dir.path();

    write(root, "system_prompt.txt", "Sos AlmostMe.\n");
    write(
        root,
        "domains.json",
        r#"[
            {"name": "hobbies", "priority": 1, "files": ["hobbies.txt"], "keywords": ["guitarra", "ajedrez"]},
            {"name": "trabajo", "priority": 5, "files": ["trabajo.txt", "proyectos.txt"], "keywords": ["empresa", "rust"]},
            {"name": "fantasma", "priority": 9, "files": ["no_existe.txt"]}
        ]"#,
    );
    write(root, "hobbies.txt", "Toco la guitarra.");
    write(root, "trabajo.txt", "Trabajo con Rust.");
    write(root, "proyectos.txt", "Mantengo un backend de chat.");
    write(
        root,
        "manuales.json",
        r#"[
            {"id": "piscina", "aliases": ["pileta"], "title": "Manual de Piscina", "url": "https://example.com/piscina", "tags": ["cloro"]},
            {"id": "jardin", "title": "Manual de Jardín", "summary": "Riego y poda.", "url": "https://example.com/jardin"}
        ]"#,
    );

    dir
}

fn domain(name: &str, priority: i32, keywords: &[&str], content: &str) -> Domain {
    Domain {
        name: name.to_string(),
        priority,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        content: content.to_string(),
    }
}

fn sample() -> Knowledge {
    Knowledge::new(
        "PROMPT",
        vec![
            domain("hobbies", 1, &["guitarra"], "Toco la guitarra."),
            domain("trabajo", 5, &["rust"], "Trabajo con Rust."),
            domain("familia", 3, &["hermana"], "Tengo una hermana."),
        ],
        Vec::new(),
    )
}

#[test]
fn loads_a_knowledge_directory() {
    let dir = fixture_dir();
    let knowledge = Knowledge::load(dir.path()).expect("load failed");

    assert_eq!(knowledge.system_prompt(), "Sos AlmostMe.");
    let names: Vec<&str> = knowledge.domains().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["trabajo", "hobbies"]);
    assert_eq!(
        knowledge.domains()[0].content,
        "Trabajo con Rust.\n\nMantengo un backend de chat."
    );

    assert_eq!(knowledge.catalog().len(), 2);
    let piscina = knowledge.catalog().get("piscina").expect("piscina loaded");
    assert_eq!(piscina.keywords, vec!["cloro".to_string()]);
}

#[test]
fn accepts_wrapped_manual_files() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "manuales.json",
        r#"{"manuales": [{"id": "auto", "title": "Manual del Auto", "url": "https://example.com/auto"}]}"#,
    );

    let knowledge = Knowledge::load(dir.path()).unwrap();
    assert_eq!(knowledge.catalog().titles(), vec!["Manual del Auto"]);
    assert_eq!(knowledge.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    assert!(knowledge.domains().is_empty());
}

#[test]
fn missing_directory_degrades_to_empty_knowledge() {
    let dir = tempfile::tempdir().unwrap();
    let knowledge = Knowledge::load(&dir.path().join("nope")).unwrap();

    assert_eq!(knowledge.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    assert!(knowledge.domains().is_empty());
    assert!(knowledge.catalog().is_empty());
}

#[test]
fn malformed_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "manuales.json", "[{\"id\": ");

    assert!(Knowledge::load(dir.path()).is_err());
}

#[test]
fn system_prompt_always_comes_first() {
    let knowledge = sample();
    for policy in [
        ContextPolicy::All,
        ContextPolicy::Ranked { extra: 0 },
        ContextPolicy::Budget { max_chars: 10 },
    ] {
        let block = knowledge.system_block(&policy, Some("hola"));
        assert!(block.starts_with("PROMPT"), "{:?} produced {}", policy, block);
    }
}

#[test]
fn all_policy_renders_every_domain_by_priority() {
    let block = sample().system_block(&ContextPolicy::All, None);

    let expected = format!(
        "PROMPT\n\n{}\n\n### trabajo\nTrabajo con Rust.\n\n### familia\nTengo una hermana.\n\n### hobbies\nToco la guitarra.",
        KNOWLEDGE_HEADER
    );
    assert_eq!(block, expected);
}

#[test]
fn ranked_policy_prefers_the_matching_domain() {
    let knowledge = sample();
    let block = knowledge.system_block(&ContextPolicy::Ranked { extra: 0 }, Some("¿Tocás la guitarra?"));

    assert!(block.contains("### hobbies"));
    assert!(!block.contains("### trabajo"));
    assert!(!block.contains("### familia"));

    let block = knowledge.system_block(&ContextPolicy::Ranked { extra: 1 }, Some("guitarra"));
    assert!(block.contains("### hobbies"));
    assert!(block.contains("### trabajo"));
    assert!(!block.contains("### familia"));
    // Rendering order stays by priority
    assert!(block.find("### trabajo") < block.find("### hobbies"));
}

#[test]
fn ranked_policy_falls_back_to_priority() {
    let block = sample().system_block(&ContextPolicy::Ranked { extra: 1 }, Some("hola"));

    assert!(block.contains("### trabajo"));
    assert!(block.contains("### familia"));
    assert!(!block.contains("### hobbies"));
}

#[test]
fn budget_policy_skips_domains_that_do_not_fit() {
    let knowledge = Knowledge::new(
        "P",
        vec![
            domain("grande", 9, &[], &"x".repeat(500)),
            domain("chico", 1, &[], "corto"),
        ],
        Vec::new(),
    );

    let block = knowledge.system_block(&ContextPolicy::Budget { max_chars: 100 }, None);
    assert!(!block.contains("### grande"));
    assert!(block.contains("### chico"));

    let block = knowledge.system_block(&ContextPolicy::Budget { max_chars: 5 }, None);
    assert_eq!(block, "P");
}

#[test]
fn output_is_deterministic() {
    let knowledge = sample();
    let policy = ContextPolicy::Ranked { extra: 1 };
    let first = knowledge.system_block(&policy, Some("rust y guitarra"));
    for _ in 0..5 {
        assert_eq!(knowledge.system_block(&policy, Some("rust y guitarra")), first);
    }
}
