//! Docker network commands and the parsing of their output

use serde::Deserialize;

use crate::resource::error::{ResourceError, Result};
use crate::types::{NetworkId, ObservedNetwork};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkCommand<'a> {
    Create { name: &'a str },
    Inspect { id: &'a NetworkId },
    Remove { id: &'a NetworkId },
}

impl NetworkCommand<'_> {
    /// Renders the command as one shell line.
    ///
    /// Every argument is quoted so that a value always reaches docker as a
    /// single word, whatever whitespace or metacharacters it contains.
    pub fn to_line(&self) -> String {
        let (verb, operand) = match self {
            NetworkCommand::Create { name } => ("create", *name),
            NetworkCommand::Inspect { id } => ("inspect", id.as_str()),
            NetworkCommand::Remove { id } => ("rm", id.as_str()),
        };

        shell_words::join(["docker", "network", verb, operand])
    }
}

/// Extracts the identity printed by `docker network create`
pub fn parse_identity(command: &str, stdout: &[u8]) -> Result<NetworkId> {
    let stdout = String::from_utf8_lossy(stdout);
    let line = stdout.strip_suffix('\n').unwrap_or(&stdout);
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.contains('\n') || line.trim() != line {
        return Err(ResourceError::consistency(
            command,
            format!("expected a single identity line, got {line:?}"),
        ));
    }

    NetworkId::new(line)
        .ok_or_else(|| ResourceError::consistency(command, "no identity was printed"))
}

#[derive(Debug, Deserialize)]
struct InspectedNetwork {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

/// Parses `docker network inspect` output, which must describe exactly one network
pub fn parse_inspect(command: &str, id: &NetworkId, stdout: &[u8]) -> Result<ObservedNetwork> {
    let networks: Vec<InspectedNetwork> = serde_json::from_slice(stdout).map_err(|e| {
        ResourceError::consistency(command, format!("failed to parse network json: {e}"))
    })?;

    let [network] = <[InspectedNetwork; 1]>::try_from(networks).map_err(|networks| {
        ResourceError::consistency(
            command,
            format!(
                "expected one network with id {id}, found {}",
                networks.len()
            ),
        )
    })?;

    Ok(ObservedNetwork {
        id: NetworkId::new(network.id).unwrap_or_else(|| id.clone()),
        name: network.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::error::ResourceErrorKind;

    fn id(value: &str) -> NetworkId {
        NetworkId::new(value).unwrap()
    }

    #[test]
    fn test_plain_name_is_not_quoted() {
        let line = NetworkCommand::Create { name: "app-net" }.to_line();
        assert_eq!(line, "docker network create app-net");
    }

    #[test]
    fn test_hostile_name_stays_one_argument() {
        let line = NetworkCommand::Create {
            name: "two words; rm -rf /",
        }
        .to_line();

        let words = shell_words::split(&line).unwrap();
        assert_eq!(
            words,
            vec!["docker", "network", "create", "two words; rm -rf /"]
        );
    }

    #[test]
    fn test_expansion_characters_are_quoted() {
        for value in ["~root", "", "it's", "a\nb", "*", "$(reboot)", "`id`"] {
            let line = NetworkCommand::Create { name: value }.to_line();
            let operand = line.trim_start_matches("docker network create ");
            assert!(operand.starts_with('\''), "{value:?} was left bare");
            assert_eq!(
                shell_words::split(&line).unwrap(),
                vec!["docker", "network", "create", value]
            );
        }
    }

    #[test]
    fn test_brace_and_glob_names_stay_one_argument() {
        for value in ["{a,b}", "net[1]", "a?b"] {
            let line = NetworkCommand::Create { name: value }.to_line();
            assert_eq!(
                shell_words::split(&line).unwrap(),
                vec!["docker", "network", "create", value]
            );
        }
    }

    #[test]
    fn test_identity_is_quoted_too() {
        let network = id("abc$(reboot)");
        let line = NetworkCommand::Remove { id: &network }.to_line();
        assert_eq!(
            shell_words::split(&line).unwrap(),
            vec!["docker", "network", "rm", "abc$(reboot)"]
        );
    }

    #[test]
    fn test_parse_identity_strips_newline() {
        let parsed = parse_identity("create", b"abc123\n").unwrap();
        assert_eq!(parsed.as_str(), "abc123");

        let parsed = parse_identity("create", b"abc123\r\n").unwrap();
        assert_eq!(parsed.as_str(), "abc123");
    }

    #[test]
    fn test_parse_identity_rejects_empty_and_multiline() {
        let err = parse_identity("create", b"\n").unwrap_err();
        assert_eq!(err.kind(), ResourceErrorKind::Consistency);

        let err = parse_identity("create", b"abc\ndef\n").unwrap_err();
        assert_eq!(err.kind(), ResourceErrorKind::Consistency);
    }

    #[test]
    fn test_parse_inspect_single_network() {
        let stdout = br#"[{"Id":"abc123","Name":"app-net","Driver":"bridge"}]"#;
        let observed = parse_inspect("inspect", &id("abc123"), stdout).unwrap();
        assert_eq!(observed.id.as_str(), "abc123");
        assert_eq!(observed.name, "app-net");
    }

    #[test]
    fn test_parse_inspect_cardinality_mismatch() {
        let err = parse_inspect("inspect", &id("abc"), b"[]").unwrap_err();
        assert_eq!(err.kind(), ResourceErrorKind::Consistency);
        assert!(err.to_string().contains("found 0"));

        let two = br#"[{"Id":"a","Name":"x"},{"Id":"b","Name":"y"}]"#;
        let err = parse_inspect("inspect", &id("abc"), two).unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_parse_inspect_malformed_json() {
        let err = parse_inspect("inspect", &id("abc"), b"not json").unwrap_err();
        assert_eq!(err.kind(), ResourceErrorKind::Consistency);

        let err = parse_inspect("inspect", &id("abc"), br#"{"Id":"abc"}"#).unwrap_err();
        assert_eq!(err.kind(), ResourceErrorKind::Consistency);
    }
}
