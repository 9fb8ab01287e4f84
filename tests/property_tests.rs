/// Property-based tests using proptest
/// Tests invariants of the pure helpers: identifier screening, env checks,
/// URL handling and config resolution.
use logiscore_ops::config::DatabaseConfig;
use logiscore_ops::db::{redact_url, Backend};
use logiscore_ops::ident::Identifier;
use logiscore_ops::stripe_verify::{check_env_vars, EnvVarStatus, REQUIRED_VARS};
use proptest::prelude::*;
use std::collections::HashMap;

fn lookup_from(map: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |key| map.get(key).cloned()
}

// Property: identifier screening never panics and only accepts plain names
proptest! {
    #[test]
    fn identifier_parse_never_panics(name in "\\PC*") {
        let _ = Identifier::parse(&name);
    }

    #[test]
    fn plain_names_are_accepted_and_quoted(name in "[a-z_][a-z0-9_]{0,40}") {
        let ident = Identifier::parse(&name).unwrap();
        prop_assert_eq!(ident.as_str(), name.as_str());
        prop_assert_eq!(ident.quoted(), format!("\"{}\"", name));
    }

    #[test]
    fn names_with_sql_metacharacters_are_rejected(
        prefix in "[a-z]{1,10}",
        meta in prop::sample::select(vec![";", "\"", "'", " ", "-", "(", ")", "."]),
        suffix in "[a-z]{0,10}"
    ) {
        let name = format!("{}{}{}", prefix, meta, suffix);
        prop_assert!(Identifier::parse(&name).is_err());
    }

    #[test]
    fn overlong_names_are_rejected(name in "[a-z]{64,80}") {
        prop_assert!(Identifier::parse(&name).is_err());
    }
}

// Property: env checks only fail on missing variables
proptest! {
    #[test]
    fn well_formed_values_pass(suffix in "[A-Za-z0-9]{1,24}") {
        let map: HashMap<String, String> = REQUIRED_VARS
            .iter()
            .map(|var| {
                let prefix = match *var {
                    "STRIPE_SECRET_KEY" => "sk_test_",
                    "STRIPE_PUBLISHABLE_KEY" => "pk_live_",
                    "STRIPE_WEBHOOK_SECRET" => "whsec_",
                    _ => "price_",
                };
                (var.to_string(), format!("{}{}", prefix, suffix))
            })
            .collect();

        let check = check_env_vars(lookup_from(map));
        prop_assert!(check.passed());
        prop_assert!(check.entries.iter().all(|(_, s)| *s == EnvVarStatus::Configured));
    }

    #[test]
    fn any_present_value_never_counts_as_missing(value in "[a-z]{1,20}") {
        let map: HashMap<String, String> = REQUIRED_VARS
            .iter()
            .map(|var| (var.to_string(), value.clone()))
            .collect();

        let check = check_env_vars(lookup_from(map));
        prop_assert!(check.passed());
        prop_assert!(check.missing().is_empty());
    }

    #[test]
    fn dropping_a_variable_fails(index in 0usize..REQUIRED_VARS.len()) {
        let map: HashMap<String, String> = REQUIRED_VARS
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, var)| (var.to_string(), "price_x".to_string()))
            .collect();

        let check = check_env_vars(lookup_from(map));
        prop_assert!(!check.passed());
        prop_assert_eq!(check.missing(), vec![REQUIRED_VARS[index]]);
    }
}

// Property: URL handling keeps secrets out of logs
proptest! {
    #[test]
    fn redacted_urls_never_contain_the_password(
        user in "[a-z]{1,10}",
        password in "[0-9]{2}[A-Za-z]{6,16}",
        host in "[a-z]{1,10}"
    ) {
        let url = format!("postgresql://{}:{}@{}:5432/logiscore", user, password, host);
        let redacted = redact_url(&url);
        prop_assert!(!redacted.contains(&password));
        prop_assert!(redacted.contains("****"));
    }

    #[test]
    fn sqlite_relative_urls_normalize(file in "[a-z]{1,12}") {
        let url = format!("sqlite:///{}.db", file);
        prop_assert_eq!(Backend::from_url(&url).unwrap(), Backend::Sqlite);
        prop_assert_eq!(Backend::Sqlite.normalize_url(&url), format!("sqlite://{}.db", file));
    }

    #[test]
    fn composed_urls_are_postgres(
        host in "[a-z]{1,12}",
        port in 1u16..=65535,
        user in "[a-z]{1,10}",
        password in "[A-Za-z0-9@:/#]{0,16}"
    ) {
        let mut map = HashMap::new();
        map.insert("DB_HOST".to_string(), host.clone());
        map.insert("DB_PORT".to_string(), port.to_string());
        map.insert("DB_USER".to_string(), user);
        map.insert("DB_PASSWORD".to_string(), password);

        let config = DatabaseConfig::from_lookup(lookup_from(map), None).unwrap();
        let parsed = url::Url::parse(&config.database_url).unwrap();
        prop_assert_eq!(Backend::from_url(&config.database_url).unwrap(), Backend::Postgres);
        prop_assert_eq!(parsed.host_str(), Some(host.as_str()));
        prop_assert_eq!(parsed.path(), "/logiscore");
    }
}
