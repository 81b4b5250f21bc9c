//! Integration tests for precache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const TAG: &str = "20260113.2";

    fn precache() -> Command {
        cargo_bin_cmd!("precache")
    }

    fn page(tag: &str) -> String {
        format!(
            r#"<!doctype html>
<html>
<head>
  <link rel="manifest" href="assets/manifest.webmanifest">
  <link rel="stylesheet" href="styles/main.css?v={tag}">
  <link rel="stylesheet" href="styles/extensions.css?v={tag}">
</head>
<body>
  <script type="module" src="scripts/motion.js?v={tag}"></script>
  <script type="module" src="scripts/core.js?v={tag}"></script>
  <script type="module" src="scripts/main.js?v={tag}"></script>
</body>
</html>"#
        )
    }

    fn proxy(tag: &str) -> String {
        format!(
            r#"// Cache version follows asset query: {tag}
const CACHE_NAME = 'site-{tag}';
const PRECACHE_URLS = [
  './',
  'about',
  'offline.html',
  'styles/main.css?v={tag}',
  'styles/extensions.css?v={tag}',
  'scripts/motion.js?v={tag}',
  'scripts/core.js?v={tag}',
  'scripts/main.js?v={tag}',
];
"#
        )
    }

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for dir in ["styles", "scripts", "assets"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        for file in [
            "styles/main.css",
            "styles/extensions.css",
            "scripts/motion.js",
            "scripts/core.js",
            "scripts/main.js",
            "assets/manifest.webmanifest",
        ] {
            fs::write(root.join(file), "").unwrap();
        }
        for name in ["index.html", "about.html", "offline.html"] {
            fs::write(root.join(name), page(TAG)).unwrap();
        }
        fs::write(root.join("sw.js"), proxy(TAG)).unwrap();
        fs::write(
            root.join("sitemap.xml"),
            "<urlset><url><loc>https://shop.test/</loc></url></urlset>",
        )
        .unwrap();
        fs::write(root.join("robots.txt"), "Sitemap: https://shop.test/sitemap.xml\n").unwrap();
        tmp
    }

    fn read(root: &Path, name: &str) -> String {
        fs::read_to_string(root.join(name)).unwrap()
    }

    #[test]
    fn help_displays() {
        precache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline-first cache proxy tooling"));
    }

    #[test]
    fn version_displays() {
        precache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("precache"));
    }

    #[test]
    fn validate_consistent_site() {
        let tmp = site();
        precache()
            .arg("-C")
            .arg(tmp.path())
            .arg("validate")
            .assert()
            .success()
            .stdout(predicate::str::contains(TAG));
    }

    #[test]
    fn validate_names_page_missing_reference() {
        let tmp = site();
        let broken = page(TAG).replace("styles/main.css?v=20260113.2", "styles/main.css");
        fs::write(tmp.path().join("about.html"), broken).unwrap();

        precache()
            .arg("-C")
            .arg(tmp.path())
            .arg("validate")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("about.html"))
            .stderr(predicate::str::contains("styles/main.css"));
    }

    #[test]
    fn validate_json_report() {
        let tmp = site();
        precache()
            .arg("-C")
            .arg(tmp.path())
            .args(["validate", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""violations": []"#));
    }

    #[test]
    fn bump_is_idempotent() {
        let tmp = site();
        precache()
            .arg("-C")
            .arg(tmp.path())
            .args(["bump", "20260201.1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("files written: 4"));

        assert!(read(tmp.path(), "index.html").contains("scripts/main.js?v=20260201.1"));
        assert!(read(tmp.path(), "sw.js").contains("site-20260201.1"));

        precache()
            .arg("-C")
            .arg(tmp.path())
            .args(["bump", "20260201.1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("files written: 0"));

        precache()
            .arg("-C")
            .arg(tmp.path())
            .arg("validate")
            .assert()
            .success()
            .stdout(predicate::str::contains("20260201.1"));
    }

    #[test]
    fn bump_rejects_malformed_tag() {
        let tmp = site();
        let before = read(tmp.path(), "index.html");

        precache()
            .arg("-C")
            .arg(tmp.path())
            .args(["bump", "2025-1"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("YYYYMMDD.N"));

        assert_eq!(read(tmp.path(), "index.html"), before);
        assert_eq!(read(tmp.path(), "sw.js"), proxy(TAG));
    }

    #[test]
    fn bump_rejects_malformed_tag_before_reading_config() {
        let tmp = site();
        fs::write(tmp.path().join("precache.toml"), "assets = [\n").unwrap();

        precache()
            .arg("-C")
            .arg(tmp.path())
            .args(["bump", "v1"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("YYYYMMDD.N"));
    }

    #[test]
    fn bump_requires_tag() {
        precache().arg("bump").assert().code(2);
    }

    #[test]
    fn generate_writes_dist_proxy() {
        let tmp = site();
        let dist = tmp.path().join("dist");
        fs::create_dir_all(dist.join("assets")).unwrap();
        fs::write(dist.join("index.html"), "<p>home</p>").unwrap();
        fs::write(dist.join("offline.html"), "<p>offline</p>").unwrap();
        fs::write(dist.join("assets/app.js"), "").unwrap();
        fs::write(dist.join("assets/app.js.br"), "").unwrap();

        precache()
            .arg("-C")
            .arg(tmp.path())
            .arg("generate")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("site-dist-{}", TAG)));

        let generated = read(&dist, "sw.js");
        assert!(generated.contains(r#""assets/app.js""#));
        assert!(!generated.contains("app.js.br"));
    }

    #[test]
    fn generate_requires_offline_page() {
        let tmp = site();
        let dist = tmp.path().join("dist");
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join("index.html"), "<p>home</p>").unwrap();

        precache()
            .arg("-C")
            .arg(tmp.path())
            .arg("generate")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("offline.html"));

        assert!(!dist.join("sw.js").exists());
    }

    #[test]
    fn config_path() {
        let tmp = TempDir::new().unwrap();
        precache()
            .arg("-C")
            .arg(tmp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("precache.toml"))
            .stdout(predicate::str::contains("using defaults"));
    }

    #[test]
    fn config_show() {
        let tmp = TempDir::new().unwrap();
        precache()
            .arg("-C")
            .arg(tmp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[site]"))
            .stdout(predicate::str::contains("[[assets]]"));
    }

    #[test]
    fn invalid_config_reported() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("precache.toml"), "assets = []\n").unwrap();

        precache()
            .arg("-C")
            .arg(tmp.path())
            .args(["config", "show"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("tracked asset"));
    }
}
