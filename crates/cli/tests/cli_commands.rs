use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn setup_tree() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(root, "libs/base/.content.toml", "kind = \"clientlib\"\n");
    write(root, "libs/base/js/base.js", "var base = true;\n");
    write(
        root,
        "libs/site/.content.toml",
        "kind = \"clientlib\"\ncategory = [\"site\"]\n",
    );
    write(
        root,
        "libs/site/js/.content.toml",
        "depends = [\"/libs/base\"]\nembed = [\"jslibs/jquery/([1-3]*:3.1.1)/jquery.js\"]\n",
    );
    write(root, "libs/site/js/site.js", "// site\nvar site = 1;\n");
    write(root, "libs/site/css/site.css", ".site {\n  color: red;\n}\n");
    write(root, "libs/jslibs/jquery/3.1.1/jquery.js", "var jq = 3;");
    temp
}

fn clientlib(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("clientlib"));
    cmd.arg("--root").arg(root).arg("--quiet");
    cmd
}

#[test]
fn render_inlines_embeds_but_not_dependencies() {
    let temp = setup_tree();
    clientlib(temp.path())
        .args(["render", "/libs/site", "--type", "js"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("var jq = 3;\n// site\nvar site = 1;"))
        .stdout(predicate::str::contains("var base").not());
}

#[test]
fn render_min_strips_comments() {
    let temp = setup_tree();
    clientlib(temp.path())
        .args(["render", "site", "--category", "--type", "css", "--min"])
        .assert()
        .success()
        .stdout(".site{color:red}\n");
}

#[test]
fn links_put_dependencies_before_the_bundle() {
    let temp = setup_tree();
    let output = clientlib(temp.path())
        .args(["links", "/libs/site"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "{stdout}");
    assert!(lines[0].starts_with("<script type=\"text/javascript\" src=\"/libs/base.js/"));
    assert!(lines[1].starts_with("<script type=\"text/javascript\" src=\"/libs/site.js/"));
}

#[test]
fn plan_json_lists_links_and_embedded_files() {
    let temp = setup_tree();
    let output = clientlib(temp.path())
        .args(["plan", "/libs/site", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: Value = serde_json::from_slice(&output.stdout).expect("valid json");

    let links: Vec<&str> = plan["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|link| link["key"]["path"].as_str().unwrap())
        .collect();
    assert_eq!(links, vec!["/libs/base.js"]);

    let embedded: Vec<&str> = plan["embedded"]
        .as_array()
        .unwrap()
        .iter()
        .map(|file| file["path"].as_str().unwrap())
        .collect();
    assert_eq!(
        embedded,
        vec!["/libs/jslibs/jquery/3.1.1/jquery.js", "/libs/site/js/site.js"]
    );
}

#[test]
fn unknown_target_fails() {
    let temp = setup_tree();
    clientlib(temp.path())
        .args(["render", "/libs/nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to render"));
}

#[test]
fn strictness_comes_from_the_config_file() {
    let temp = setup_tree();
    let root = temp.path();
    write(
        root,
        "libs/broken/.content.toml",
        "kind = \"clientlib\"\n",
    );
    write(
        root,
        "libs/broken/js/.content.toml",
        "embed = [\"/libs/missing.js\"]\n",
    );
    write(root, "libs/broken/js/ok.js", "var ok;");

    clientlib(root)
        .args(["render", "/libs/broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing mandatory reference"));

    let config = root.join("lenient.toml");
    fs::write(&config, "strict_dependencies = false\n").unwrap();
    clientlib(root)
        .arg("--config")
        .arg(&config)
        .args(["render", "/libs/broken"])
        .assert()
        .success()
        .stdout("var ok;\n");
}

#[test]
fn serve_http_refuses_non_loopback_without_public() {
    let temp = setup_tree();
    clientlib(temp.path())
        .args(["serve-http", "--bind", "0.0.0.0:0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to bind"));
}
