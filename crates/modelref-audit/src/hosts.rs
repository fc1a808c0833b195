//! Download host extraction used when the server's audit data is missing.

use url::Url;

/// Distinct hosts of `urls`, in first-seen order. Unparseable URLs and URLs
/// without a host are skipped.
pub fn hosts_from_urls<'a>(urls: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for raw in urls {
        let Some(host) = Url::parse(raw.trim())
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .filter(|h| !h.is_empty())
        else {
            continue;
        };
        if !hosts.contains(&host) {
            hosts.push(host);
        }
    }
    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_and_keeps_order() {
        let hosts = hosts_from_urls([
            "https://huggingface.co/a/resolve/main/a.safetensors",
            "https://civitai.com/api/download/models/1",
            "https://HuggingFace.co/b/resolve/main/b.safetensors",
        ]);
        assert_eq!(hosts, vec!["huggingface.co", "civitai.com"]);
    }

    #[test]
    fn skips_garbage() {
        assert!(hosts_from_urls(["", "not a url", "file:///tmp/model.ckpt"]).is_empty());
    }
}
