use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Credentials and target for a database connection.
///
/// This is the canonical structured form; the textual connection string is a
/// thin serialization of it, and both forms round-trip exactly. Operations
/// that accept discrete credential components construct a profile and
/// delegate, so the codec logic lives in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnectionProfile {
    pub fn new(
        server: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    /// Serialize to the documented grammar:
    ///
    /// `Server=<server>;Database=<database>;User Id=<user>;Password=<password>;`
    ///
    /// Values may contain `=`; values containing `;` are not representable in
    /// this grammar.
    pub fn to_connection_string(&self) -> String {
        format!(
            "Server={};Database={};User Id={};Password={};",
            self.server, self.database, self.user, self.password
        )
    }

    /// Parse a connection string in the grammar produced by
    /// [`ConnectionProfile::to_connection_string`]. Keys are matched
    /// case-insensitively; values are taken verbatim.
    pub fn parse(connection_string: &str) -> Result<Self> {
        if connection_string.trim().is_empty() {
            return Err(Error::MalformedConnectionString(
                "empty connection string".to_string(),
            ));
        }

        let mut server = None;
        let mut database = None;
        let mut user = None;
        let mut password = None;

        for pair in connection_string.split(';') {
            if pair.is_empty() {
                continue;
            }

            let Some((key, value)) = pair.split_once('=') else {
                return Err(Error::MalformedConnectionString(format!(
                    "expected key=value, got `{pair}`"
                )));
            };

            let slot = match key.to_ascii_lowercase().as_str() {
                "server" => &mut server,
                "database" => &mut database,
                "user id" => &mut user,
                "password" => &mut password,
                other => {
                    return Err(Error::MalformedConnectionString(format!(
                        "unknown key `{other}`"
                    )));
                }
            };

            if slot.replace(value.to_string()).is_some() {
                return Err(Error::MalformedConnectionString(format!(
                    "duplicate key `{key}`"
                )));
            }
        }

        Ok(Self {
            server: required(server, "Server")?,
            database: required(database, "Database")?,
            user: required(user, "User Id")?,
            password: required(password, "Password")?,
        })
    }

    /// Connection string with the password masked, safe for logs.
    pub fn redacted(&self) -> String {
        format!(
            "Server={};Database={};User Id={};Password=***;",
            self.server, self.database, self.user
        )
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    value.ok_or_else(|| Error::MalformedConnectionString(format!("missing key `{key}`")))
}

/// Build a connection string from discrete credential components.
///
/// Pure and deterministic: the same inputs always yield the same string.
pub fn build_connection_string(server: &str, database: &str, user: &str, password: &str) -> String {
    ConnectionProfile::new(server, database, user, password).to_connection_string()
}

/// Break a connection string into `(server, database, user, password)`.
///
/// Exact inverse of [`build_connection_string`]; round-tripping reproduces
/// the original values bit-for-bit.
pub fn break_connection_string(
    connection_string: &str,
) -> Result<(String, String, String, String)> {
    let profile = ConnectionProfile::parse(connection_string)?;
    Ok((
        profile.server,
        profile.database,
        profile.user,
        profile.password,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_credentials_exactly() {
        let conn = build_connection_string("SRV1", "DB1", "user", "pw");
        assert_eq!(conn, "Server=SRV1;Database=DB1;User Id=user;Password=pw;");

        let (server, database, user, password) = break_connection_string(&conn).unwrap();
        assert_eq!(server, "SRV1");
        assert_eq!(database, "DB1");
        assert_eq!(user, "user");
        assert_eq!(password, "pw");
    }

    #[test]
    fn build_is_deterministic() {
        let first = build_connection_string("srv", "db", "u", "p");
        let second = build_connection_string("srv", "db", "u", "p");
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_empty_input() {
        let err = break_connection_string("").unwrap_err();
        assert!(matches!(err, Error::MalformedConnectionString(_)));

        let err = break_connection_string("   ").unwrap_err();
        assert!(matches!(err, Error::MalformedConnectionString(_)));
    }

    #[test]
    fn rejects_missing_required_key() {
        let err = break_connection_string("Server=a;Database=b;User Id=c;").unwrap_err();
        assert!(matches!(err, Error::MalformedConnectionString(_)));
    }

    #[test]
    fn rejects_pairs_without_equals() {
        let err = break_connection_string("not a connection string").unwrap_err();
        assert!(matches!(err, Error::MalformedConnectionString(_)));
    }

    #[test]
    fn rejects_unknown_and_duplicate_keys() {
        let err =
            break_connection_string("Server=a;Database=b;User Id=c;Password=d;Timeout=5;")
                .unwrap_err();
        assert!(matches!(err, Error::MalformedConnectionString(_)));

        let err =
            break_connection_string("Server=a;Server=b;Database=c;User Id=d;Password=e;")
                .unwrap_err();
        assert!(matches!(err, Error::MalformedConnectionString(_)));
    }

    #[test]
    fn values_may_contain_equals() {
        let (_, _, _, password) =
            break_connection_string("Server=a;Database=b;User Id=c;Password=p=w=1;").unwrap();
        assert_eq!(password, "p=w=1");
    }

    #[test]
    fn keys_match_case_insensitively() {
        let profile =
            ConnectionProfile::parse("server=a;DATABASE=b;user id=c;password=d;").unwrap();
        assert_eq!(profile.server, "a");
        assert_eq!(profile.database, "b");
    }

    #[test]
    fn redacted_masks_password_only() {
        let profile = ConnectionProfile::new("srv", "db", "user", "secret");
        let redacted = profile.redacted();
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("Password=***"));
        assert!(redacted.contains("Server=srv"));
    }
}
