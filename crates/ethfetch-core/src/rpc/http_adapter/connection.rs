use reqwest::Url;

use crate::error::RpcError;

pub(super) fn resolve_auth(
    user: Option<&str>,
    pass: Option<&str>,
) -> Result<Option<(String, String)>, RpcError> {
    match (user, pass) {
        (Some(u), Some(p)) => Ok(Some((u.to_owned(), p.to_owned()))),
        (Some(_), None) | (None, Some(_)) => Err(RpcError::InvalidConfig(
            "both rpc user and rpc pass must be set together".to_owned(),
        )),
        (None, None) => Ok(None),
    }
}

pub(super) fn parse_connection(connection: &str) -> Result<String, RpcError> {
    let parsed = Url::parse(connection).map_err(|e| {
        RpcError::InvalidConfig(format!(
            "invalid node url `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(connection.to_owned()),
        other => Err(RpcError::InvalidConfig(format!(
            "unsupported node url scheme `{other}`; expected http or https"
        ))),
    }
}
