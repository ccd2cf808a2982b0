use {log::warn, std::time::Duration};

/// Host name advertised when `--host` is not given.
pub fn default_host() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => match name.into_string() {
            Ok(name) if !name.is_empty() => name,
            _ => {
                warn!("Host name is not valid UTF-8, advertising localhost");
                "localhost".to_owned()
            }
        },
        Err(e) => {
            warn!("Unable to determine host name ({}), advertising localhost", e);
            "localhost".to_owned()
        }
    }
}

/// `--timeout` is in whole seconds; zero disables it.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
