use kcenter_rs::config::Config;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::time::Duration;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn broker_absent_without_address() {
    let config = Config::from_lookup(lookup(&[])).unwrap();
    assert!(config.broker.is_none());
    assert_eq!(config.http_addr, "0.0.0.0:8080");
    assert_eq!(config.log_level, "info");
}

#[test]
fn blank_address_counts_as_absent() {
    let config = Config::from_lookup(lookup(&[("REDIS_ADDR", "  ")])).unwrap();
    assert!(config.broker.is_none());
}

#[test]
fn broker_defaults_apply() {
    let config = Config::from_lookup(lookup(&[("REDIS_ADDR", "localhost:6379")])).unwrap();
    let broker = config.broker.unwrap();
    assert_eq!(broker.addr, "localhost:6379");
    assert!(broker.password.is_none());
    assert_eq!(broker.db, 0);
    assert_eq!(broker.queue, "celery");
    assert_eq!(broker.result_ttl, Duration::from_secs(3600));
}

#[test]
fn broker_overrides_are_read() {
    let config = Config::from_lookup(lookup(&[
        ("REDIS_ADDR", "redis.internal:6380"),
        ("REDIS_PASSWORD", "s3cret"),
        ("REDIS_DB", "2"),
        ("AI_QUEUE_NAME", "ai"),
        ("AI_RESULT_TTL", "120"),
    ]))
    .unwrap();
    let broker = config.broker.unwrap();
    assert_eq!(broker.password.unwrap().expose_secret(), "s3cret");
    assert_eq!(broker.db, 2);
    assert_eq!(broker.queue, "ai");
    assert_eq!(broker.result_ttl, Duration::from_secs(120));
}

#[test]
fn invalid_db_index_fails() {
    let result = Config::from_lookup(lookup(&[
        ("REDIS_ADDR", "localhost:6379"),
        ("REDIS_DB", "zero"),
    ]));
    assert!(result.is_err());
}

#[test]
fn password_is_redacted_in_debug_output() {
    let config = Config::from_lookup(lookup(&[
        ("REDIS_ADDR", "localhost:6379"),
        ("REDIS_PASSWORD", "s3cret"),
    ]))
    .unwrap();
    assert!(!format!("{config:?}").contains("s3cret"));
}

#[test]
fn config_from_env_reads_process_environment() {
    unsafe {
        std::env::set_var("HTTP_ADDR", "127.0.0.1:9999");
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.http_addr, "127.0.0.1:9999");

    unsafe {
        std::env::remove_var("HTTP_ADDR");
    }
}
