//! Integration tests for sootcache

mod support {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    /// Static site served from a background thread
    pub struct Site {
        pub origin: String,
        offline: Arc<AtomicBool>,
    }

    impl Site {
        pub fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let origin = format!("http://{}", listener.local_addr().unwrap());
            let offline = Arc::new(AtomicBool::new(false));

            let flag = offline.clone();
            thread::spawn(move || {
                for stream in listener.incoming().flatten() {
                    if flag.load(Ordering::SeqCst) {
                        drop(stream);
                        continue;
                    }
                    serve(stream);
                }
            });

            Self { origin, offline }
        }

        /// Drop every connection without answering
        pub fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }
    }

    fn serve(stream: TcpStream) {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
            return;
        }
        loop {
            let mut header = String::new();
            match reader.read_line(&mut header) {
                Ok(0) | Err(_) => return,
                Ok(_) if header == "\r\n" => break,
                Ok(_) => {}
            }
        }

        let path = request_line.split_whitespace().nth(1).unwrap_or("/");
        let (status, content_type, body) = match path {
            "/" => ("200 OK", "text/html", "<h1>Soot & Silicon</h1>".to_string()),
            "/offline.html" => ("200 OK", "text/html", "<h1>You are offline</h1>".to_string()),
            "/assets/css/main.css" => ("200 OK", "text/css", "body { color: #222; }".to_string()),
            _ => ("404 Not Found", "text/plain", "not found".to_string()),
        };

        let mut stream = reader.into_inner();
        let _ = write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        );
    }

    /// Isolated config and state directory
    pub struct Env {
        pub temp: TempDir,
    }

    impl Env {
        pub fn new(origin: &str) -> Self {
            let temp = TempDir::new().unwrap();
            let config = format!(
                r#"[worker]
cache_name = "soot-silicon-test"
origin = "{origin}"
precache = ["/", "/offline.html", "/assets/css/main.css"]

[network]
timeout_secs = 5
"#
            );
            std::fs::write(temp.path().join("config.toml"), config).unwrap();
            Self { temp }
        }

        pub fn config_path(&self) -> PathBuf {
            self.temp.path().join("config.toml")
        }

        pub fn state_dir(&self) -> PathBuf {
            self.temp.path().join("state")
        }

        pub fn registration(&self) -> Option<serde_json::Value> {
            let path = self.state_dir().join("registration.json");
            read_json(&path)
        }

        pub fn sootcache(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("sootcache");
            cmd.arg("--config")
                .arg(self.config_path())
                .arg("--state-dir")
                .arg(self.state_dir());
            for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
                cmd.env_remove(var);
            }
            cmd.env("CI", "1");
            cmd
        }
    }

    fn read_json(path: &Path) -> Option<serde_json::Value> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }
}

mod cli_tests {
    use super::support::{Env, Site};
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;

    const UNREACHABLE: &str = "http://127.0.0.1:1";

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("sootcache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline cache worker"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("sootcache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("sootcache"));
    }

    #[test]
    fn config_path_honors_flag() {
        let env = Env::new(UNREACHABLE);
        env.sootcache()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(env.config_path().display().to_string()));
    }

    #[test]
    fn config_show() {
        let env = Env::new(UNREACHABLE);
        env.sootcache()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("soot-silicon-test"))
            .stdout(predicate::str::contains("[notifications]"));
    }

    #[test]
    fn config_init_writes_defaults() {
        let env = Env::new(UNREACHABLE);
        let path = env.temp.path().join("fresh").join("config.toml");

        cargo_bin_cmd!("sootcache")
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .env("CI", "1")
            .assert()
            .success();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("soot-silicon-v1"));
    }

    #[test]
    fn status_with_empty_state() {
        let env = Env::new(UNREACHABLE);
        env.sootcache()
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"buckets\": []"))
            .stdout(predicate::str::contains("\"active\": null"));
    }

    #[test]
    fn fetch_without_active_worker_fails() {
        let env = Env::new(UNREACHABLE);
        env.sootcache()
            .args(["fetch", "/"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No active worker"))
            .stderr(predicate::str::contains("sootcache install"));
    }

    #[test]
    fn activate_without_waiting_fails() {
        let env = Env::new(UNREACHABLE);
        env.sootcache()
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn install_fails_when_origin_unreachable() {
        let env = Env::new(UNREACHABLE);
        env.sootcache()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));

        assert!(env.registration().is_none());
    }

    #[test]
    fn clear_cache_with_yes() {
        let env = Env::new(UNREACHABLE);
        env.sootcache()
            .args(["message", "clear-cache", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared soot-silicon-test"));
    }

    #[test]
    fn clear_cache_without_yes_keeps_cache_in_ci() {
        let env = Env::new(UNREACHABLE);
        env.sootcache()
            .args(["message", "clear-cache"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cancelled"));
    }

    #[test]
    fn install_then_serve_offline() {
        let site = Site::start();
        let env = Env::new(&site.origin);

        env.sootcache()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("soot-silicon-test is active"));

        let registration = env.registration().unwrap();
        assert_eq!(registration["active"]["cache_name"], "soot-silicon-test");
        assert_eq!(registration["active"]["state"], "active");

        env.sootcache()
            .args(["fetch", "/assets/css/main.css"])
            .assert()
            .success()
            .stdout(predicate::str::contains("source: cache"))
            .stdout(predicate::str::contains("color: #222"));

        site.go_offline();

        env.sootcache()
            .args(["fetch", "/blog/", "--navigate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("source: offline fallback"))
            .stdout(predicate::str::contains("You are offline"));

        env.sootcache()
            .args(["fetch", "/missing.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network"));

        env.sootcache()
            .args(["status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("soot-silicon-test\t3\t"));
    }

    #[test]
    fn failed_reinstall_keeps_active_version() {
        let site = Site::start();
        let env = Env::new(&site.origin);
        env.sootcache().arg("install").assert().success();

        site.go_offline();

        env.sootcache().arg("install").assert().failure();

        let registration = env.registration().unwrap();
        assert_eq!(registration["active"]["cache_name"], "soot-silicon-test");

        env.sootcache()
            .args(["fetch", "/"])
            .assert()
            .success()
            .stdout(predicate::str::contains("source: cache"));
    }

    #[test]
    fn push_and_click_through_active_worker() {
        let site = Site::start();
        let env = Env::new(&site.origin);
        env.sootcache().arg("install").assert().success();

        env.sootcache()
            .args(["push", "New post"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Soot & Silicon"))
            .stdout(predicate::str::contains("New post"))
            .stdout(predicate::str::contains("View (explore)"));

        env.sootcache()
            .args(["click", "explore"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("{}/", site.origin)));

        env.sootcache()
            .args(["sync", "contact-form-sync"])
            .assert()
            .success();
    }
}
