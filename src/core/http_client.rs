use std::time::Duration;

use reelgrab_core::models::settings::{AppSettings, ProxySettings};

const USER_AGENT: &str = concat!("reelgrab/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

pub fn proxy_url(proxy: &ProxySettings) -> Option<String> {
    if !proxy.enabled || proxy.host.is_empty() {
        return None;
    }
    let scheme = match proxy.proxy_type.as_str() {
        "socks5" => "socks5",
        "https" => "https",
        _ => "http",
    };
    if proxy.username.is_empty() {
        Some(format!("{}://{}:{}", scheme, proxy.host, proxy.port))
    } else {
        Some(format!(
            "{}://{}:{}@{}:{}",
            scheme, proxy.username, proxy.password, proxy.host, proxy.port
        ))
    }
}

pub fn apply_proxy(
    builder: reqwest::ClientBuilder,
    proxy: &ProxySettings,
) -> reqwest::ClientBuilder {
    let Some(url) = proxy_url(proxy) else {
        return builder;
    };
    match reqwest::Proxy::all(&url) {
        Ok(p) => builder.proxy(p),
        Err(e) => {
            tracing::warn!("Invalid proxy URL: {}", e);
            builder
        }
    }
}

/// No overall timeout here: downloads are bounded per chunk instead.
pub fn build_client(settings: &AppSettings) -> reqwest::Client {
    let builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT);
    apply_proxy(builder, &settings.proxy)
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(kind: &str, user: &str) -> ProxySettings {
        ProxySettings {
            enabled: true,
            proxy_type: kind.into(),
            host: "10.0.0.2".into(),
            port: 1080,
            username: user.into(),
            password: "pw".into(),
        }
    }

    #[test]
    fn disabled_proxy_has_no_url() {
        assert_eq!(proxy_url(&ProxySettings::default()), None);
        let mut p = proxy("http", "");
        p.host.clear();
        assert_eq!(proxy_url(&p), None);
    }

    #[test]
    fn proxy_url_schemes() {
        assert_eq!(proxy_url(&proxy("socks5", "")).unwrap(), "socks5://10.0.0.2:1080");
        assert_eq!(proxy_url(&proxy("ftp", "")).unwrap(), "http://10.0.0.2:1080");
        assert_eq!(
            proxy_url(&proxy("https", "me")).unwrap(),
            "https://me:pw@10.0.0.2:1080"
        );
    }
}
