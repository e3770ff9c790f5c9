use overleaf_client::{ClientConfig, ClientError, OverleafClient};

#[test]
fn default_session_cookie_name() {
    let config = ClientConfig::default();
    assert_eq!(config.session_cookie_name, "sharelatex.sid");
}

#[test]
fn default_request_timeout() {
    assert_eq!(ClientConfig::default().request_timeout_secs, 60);
}

#[test]
fn url_strips_trailing_slash() {
    let config = ClientConfig::for_host("https://overleaf.example.org/");
    assert_eq!(config.base_url(), "https://overleaf.example.org");
    assert_eq!(config.url("/project"), "https://overleaf.example.org/project");
}

#[test]
fn empty_host_is_rejected() {
    let err = OverleafClient::new(ClientConfig::for_host("  ")).err().unwrap();
    assert!(matches!(err, ClientError::Config(_)));
}

#[test]
fn serialization_roundtrip() {
    let mut config = ClientConfig::for_host("https://latex.example.edu");
    config.session_cookie_name = "overleaf.sid".into();
    let json = serde_json::to_string(&config).unwrap();
    let deserialized: ClientConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.host, config.host);
    assert_eq!(deserialized.session_cookie_name, "overleaf.sid");
    assert_eq!(deserialized.request_timeout_secs, config.request_timeout_secs);
    assert_eq!(deserialized.user_agent, config.user_agent);
}
