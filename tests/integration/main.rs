//! Integration tests for Depot

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A config file plus catalog, storage, and upstream directories
    struct Env {
        temp: TempDir,
    }

    impl Env {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let config = format!(
                "[storage]\nroot = {:?}\n\n[catalog]\ndir = {:?}\n",
                temp.path().join("storage").display().to_string(),
                temp.path().join("stores").display().to_string(),
            );
            fs::write(temp.path().join("config.toml"), config).unwrap();
            Self { temp }
        }

        fn config_path(&self) -> PathBuf {
            self.temp.path().join("config.toml")
        }

        fn define(&self, store_type: &str, name: &str, json: &str) {
            let dir = self.temp.path().join("stores").join(store_type);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("{}.json", name)), json).unwrap();
        }

        fn hosted(&self, name: &str) {
            self.define(
                "hosted",
                name,
                &format!(r#"{{"type": "hosted", "name": "{}"}}"#, name),
            );
        }

        /// Remote store proxying a local upstream directory, which is returned
        fn remote(&self, name: &str) -> PathBuf {
            let upstream = self.temp.path().join("upstream").join(name);
            fs::create_dir_all(&upstream).unwrap();
            self.define(
                "remote",
                name,
                &format!(
                    r#"{{"type": "remote", "name": "{}", "url": "file://{}"}}"#,
                    name,
                    upstream.display()
                ),
            );
            upstream
        }

        fn group(&self, name: &str, members: &[&str]) {
            let members: Vec<String> = members.iter().map(|m| format!("\"{}\"", m)).collect();
            self.define(
                "group",
                name,
                &format!(
                    r#"{{"type": "group", "name": "{}", "constituents": [{}]}}"#,
                    name,
                    members.join(", ")
                ),
            );
        }

        fn file(&self, name: &str, content: &str) -> PathBuf {
            let path = self.temp.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn depot(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("depot");
            cmd.arg("--config").arg(self.config_path());
            cmd
        }
    }

    fn write_upstream(upstream: &Path, path: &str, content: &str) {
        let file = upstream.join(path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, content).unwrap();
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("depot")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("content router"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("depot")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("depot"));
    }

    #[test]
    fn config_path_honours_flag() {
        let env = Env::new();
        env.depot()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let env = Env::new();
        env.depot()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[index]").and(predicate::str::contains("storage")));
    }

    #[test]
    fn members_follow_declared_order() {
        let env = Env::new();
        env.hosted("test");
        env.remote("test");
        env.remote("first");
        env.remote("second");
        env.group("inner", &["remote:test", "remote:first"]);
        env.group("public", &["hosted:test", "group:inner", "remote:second"]);

        env.depot()
            .args(["members", "public", "--format", "plain"])
            .assert()
            .success()
            .stdout("hosted:test\nremote:test\nremote:first\nremote:second\n");

        env.depot()
            .args(["members", "group:public", "--include-groups", "--format", "plain"])
            .assert()
            .success()
            .stdout(
                "group:public\nhosted:test\ngroup:inner\nremote:test\nremote:first\nremote:second\n",
            );
    }

    #[test]
    fn put_into_group_then_get() {
        let env = Env::new();
        env.remote("central");
        env.hosted("local");
        env.group("public", &["remote:central", "hosted:local"]);
        let file = env.file("a.jar", "jar-bytes");

        env.depot()
            .args(["put", "group:public", "org/a/1.0/a-1.0.jar"])
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("hosted:local"));

        env.depot()
            .args(["get", "group:public", "org/a/1.0/a-1.0.jar"])
            .assert()
            .success()
            .stdout("jar-bytes");

        env.depot()
            .args(["exists", "hosted:local", "org/a/1.0/a-1.0.jar"])
            .assert()
            .success();
    }

    #[test]
    fn get_pulls_from_remote_upstream() {
        let env = Env::new();
        let upstream = env.remote("central");
        env.hosted("local");
        env.group("public", &["hosted:local", "remote:central"]);
        write_upstream(&upstream, "org/x/1/x-1.pom", "<project/>");

        let out = env.temp.path().join("x.pom");
        env.depot()
            .args(["get", "group:public", "org/x/1/x-1.pom", "-o"])
            .arg(&out)
            .assert()
            .success()
            .stderr(predicate::str::contains("remote:central"));
        assert_eq!(fs::read_to_string(out).unwrap(), "<project/>");
    }

    #[test]
    fn checksum_is_generated() {
        let env = Env::new();
        env.hosted("local");
        let file = env.file("hello.txt", "hello");

        env.depot()
            .args(["put", "hosted:local", "docs/hello.txt"])
            .arg(&file)
            .assert()
            .success();

        env.depot()
            .args(["get", "hosted:local", "docs/hello.txt.sha256"])
            .assert()
            .success()
            .stdout("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
    }

    #[test]
    fn version_lists_are_merged_across_group() {
        let env = Env::new();
        let first = env.remote("first");
        let second = env.remote("second");
        env.group("public", &["remote:first", "remote:second"]);
        write_upstream(&first, "org/foo/versions.json", r#"["1.0.0", "1.2.0"]"#);
        write_upstream(&second, "org/foo/versions.json", r#"["1.1.0"]"#);

        env.depot()
            .args(["get", "group:public", "org/foo/versions.json"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("1.0.0")
                    .and(predicate::str::contains("1.1.0"))
                    .and(predicate::str::contains("1.2.0")),
            );
    }

    #[test]
    fn ls_lists_group_content_as_json() {
        let env = Env::new();
        env.hosted("a");
        env.hosted("b");
        env.group("public", &["hosted:a", "hosted:b"]);
        let file = env.file("x", "x");

        env.depot()
            .args(["put", "hosted:b", "org/x.jar"])
            .arg(&file)
            .assert()
            .success();

        env.depot()
            .args(["ls", "group:public", "org", "--format", "json"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"org/x.jar\"")
                    .and(predicate::str::contains("\"hosted:b\""))
                    .and(predicate::str::contains("org/x.jar.sha256")),
            );
    }

    #[test]
    fn delete_from_group_removes_everywhere() {
        let env = Env::new();
        env.hosted("a");
        env.hosted("b");
        env.group("public", &["hosted:a", "hosted:b"]);
        let file = env.file("x", "x");

        for store in ["hosted:a", "hosted:b"] {
            env.depot()
                .args(["put", store, "x.jar"])
                .arg(&file)
                .assert()
                .success();
        }

        env.depot()
            .args(["delete", "group:public", "x.jar"])
            .assert()
            .success();

        env.depot()
            .args(["exists", "group:public", "x.jar"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn get_missing_fails() {
        let env = Env::new();
        env.hosted("local");

        env.depot()
            .args(["get", "hosted:local", "nope.jar"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn put_into_remote_is_rejected() {
        let env = Env::new();
        env.remote("central");
        let file = env.file("x", "x");

        env.depot()
            .args(["put", "remote:central", "x.jar"])
            .arg(&file)
            .assert()
            .failure()
            .stderr(predicate::str::contains("does not accept uploads"));
    }

    #[test]
    fn unknown_group_fails_with_hint() {
        let env = Env::new();
        env.depot()
            .args(["members", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Group not found").and(predicate::str::contains("Hint:")));
    }

    #[test]
    fn malformed_store_key_is_rejected() {
        let env = Env::new();
        env.depot().args(["get", "public", "x"]).assert().failure();
    }

    #[test]
    fn stores_lists_definitions() {
        let env = Env::new();
        env.hosted("local");
        env.group("public", &["hosted:local"]);

        env.depot()
            .args(["stores", "--format", "plain"])
            .assert()
            .success()
            .stdout("hosted:local\ngroup:public\n");
    }

    #[test]
    fn malformed_definition_is_fatal() {
        let env = Env::new();
        env.define("hosted", "broken", "{ not json");

        env.depot()
            .args(["stores"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid store definition"));
    }
}
