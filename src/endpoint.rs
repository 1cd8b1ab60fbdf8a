// 传输端点解析: [user@]host:path
use std::fmt;

/// One side of a transfer. `host` unset means the local file system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub host: Option<String>,
    pub username: Option<String>,
    pub path: String,
}

impl Endpoint {
    /// Parses `path`, `host:path`, `user@host:path` or `user@path`.
    ///
    /// Only dotted-quad IPv4 literals are recognised as hosts. A token such
    /// as `example.com:/tmp/x` has no recognised host and is taken as a local
    /// path in full.
    pub fn parse(token: &str) -> Self {
        let (username, rest) = match token.split_once('@') {
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, token),
        };

        match rest.split_once(':') {
            Some((host, path)) if is_dotted_quad(host) => Endpoint {
                host: Some(host.to_string()),
                username,
                path: path.to_string(),
            },
            _ => Endpoint {
                host: None,
                username,
                path: rest.to_string(),
            },
        }
    }

    pub fn is_remote(&self) -> bool {
        self.host.is_some()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.host, &self.username) {
            (Some(host), Some(user)) => write!(f, "{}@{}:{}", user, host, self.path),
            (Some(host), None) => write!(f, "{}:{}", host, self.path),
            (None, _) => f.write_str(&self.path),
        }
    }
}

// 四组十进制数字，以点分隔；不检查每组的取值范围
fn is_dotted_quad(s: &str) -> bool {
    let groups: Vec<&str> = s.split('.').collect();
    groups.len() == 4
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(user: Option<&str>, host: &str, path: &str) -> Endpoint {
        Endpoint {
            host: Some(host.to_string()),
            username: user.map(str::to_string),
            path: path.to_string(),
        }
    }

    #[test]
    fn parses_user_host_path() {
        assert_eq!(
            Endpoint::parse("alice@10.0.0.5:/tmp/a.txt"),
            remote(Some("alice"), "10.0.0.5", "/tmp/a.txt")
        );
        assert_eq!(
            Endpoint::parse("user@1.2.3.4:path"),
            remote(Some("user"), "1.2.3.4", "path")
        );
    }

    #[test]
    fn parses_host_path_without_user() {
        assert_eq!(
            Endpoint::parse("192.168.0.1:backup/db.sql"),
            remote(None, "192.168.0.1", "backup/db.sql")
        );
    }

    #[test]
    fn plain_token_is_local_path() {
        let ep = Endpoint::parse("local/b.txt");
        assert_eq!(ep.host, None);
        assert_eq!(ep.username, None);
        assert_eq!(ep.path, "local/b.txt");
    }

    #[test]
    fn dns_host_is_not_recognised() {
        let ep = Endpoint::parse("example.com:/etc/hosts");
        assert!(!ep.is_remote());
        assert_eq!(ep.path, "example.com:/etc/hosts");

        let ep = Endpoint::parse("bob@server:/srv/file");
        assert!(!ep.is_remote());
        assert_eq!(ep.username.as_deref(), Some("bob"));
        assert_eq!(ep.path, "server:/srv/file");
    }

    #[test]
    fn user_without_host_keeps_username_on_local_path() {
        let ep = Endpoint::parse("carol@notes.txt");
        assert_eq!(ep.host, None);
        assert_eq!(ep.username.as_deref(), Some("carol"));
        assert_eq!(ep.path, "notes.txt");
    }

    #[test]
    fn splits_at_first_at_and_first_colon() {
        let ep = Endpoint::parse("a@b@10.1.1.1:x:y");
        assert_eq!(ep.username.as_deref(), Some("a"));
        assert!(!ep.is_remote());
        assert_eq!(ep.path, "b@10.1.1.1:x:y");

        let ep = Endpoint::parse("10.1.1.1:x:y");
        assert_eq!(ep.host.as_deref(), Some("10.1.1.1"));
        assert_eq!(ep.path, "x:y");
    }

    #[test]
    fn windows_drive_letter_stays_local() {
        let ep = Endpoint::parse("c:\\hello.txt");
        assert!(!ep.is_remote());
        assert_eq!(ep.path, "c:\\hello.txt");
    }

    #[test]
    fn dotted_quad_rules() {
        assert!(is_dotted_quad("0.0.0.0"));
        assert!(is_dotted_quad("999.1.22.333"));
        assert!(!is_dotted_quad("1.2.3"));
        assert!(!is_dotted_quad("1.2.3.4.5"));
        assert!(!is_dotted_quad("1..3.4"));
        assert!(!is_dotted_quad("1.2.3.a"));
        assert!(!is_dotted_quad(""));
    }

    #[test]
    fn empty_path_after_host() {
        let ep = Endpoint::parse("10.0.0.5:");
        assert!(ep.is_remote());
        assert_eq!(ep.path, "");
    }

    #[test]
    fn display_round_trips() {
        for token in ["alice@10.0.0.5:/tmp/a.txt", "local/b.txt", "10.0.0.5:x"] {
            assert_eq!(Endpoint::parse(token).to_string(), token);
        }
        // 本地端点的用户名不显示
        assert_eq!(Endpoint::parse("carol@notes.txt").to_string(), "notes.txt");
    }
}
