//! Mock registries and in-memory tarballs for handler tests

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Map, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pkgcdn_config::ServerConfig;

use crate::app::AppContext;

/// Modification time of every tarball member
pub const MTIME: u64 = 1_600_000_000;

/// Gzipped tarball; a path ending in `/` becomes a directory header
pub fn tgz(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in members {
        let mut header = tar::Header::new_gnu();
        header.set_mtime(MTIME);
        if path.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
            builder.append_data(&mut header, path, io::empty()).unwrap();
        } else {
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(0o644);
            header.set_size(data.len() as u64);
            builder.append_data(&mut header, path, *data).unwrap();
        }
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

/// Serve a packument for `name` and the same tarball for every version
pub async fn mount_package(server: &MockServer, name: &str, versions: &[(&str, Value)], latest: &str, tarball: Vec<u8>) {
    mount_packument(server, name, versions, latest).await;

    let basename = name.rsplit('/').next().unwrap_or(name);
    for (version, _) in versions {
        Mock::given(method("GET"))
            .and(path(format!("/{}/-/{}-{}.tgz", name, basename, version)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(tarball.clone()))
            .mount(server)
            .await;
    }
}

/// Serve only the packument. Each manifest gets its `name` and `version`
/// filled in; `Value::Null` manifests are kept as is.
pub async fn mount_packument(server: &MockServer, name: &str, versions: &[(&str, Value)], latest: &str) {
    let mut manifests = Map::new();
    for (version, manifest) in versions {
        let manifest = match manifest.clone() {
            Value::Object(mut fields) => {
                fields.insert("name".to_string(), json!(name));
                fields.insert("version".to_string(), json!(version));
                Value::Object(fields)
            }
            other => other,
        };
        manifests.insert(version.to_string(), manifest);
    }

    let document = json!({
        "name": name,
        "dist-tags": {"latest": latest},
        "versions": manifests,
    });

    Mock::given(method("GET"))
        .and(path(format!("/{}", name.replacen('/', "%2F", 1))))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(server)
        .await;
}

/// Context talking to `registry`, rewriting modules under `https://cdn.example`
pub fn context_for(registry: &MockServer) -> AppContext {
    let mut config = ServerConfig::default();
    config.origin = "https://cdn.example".to_string();
    config.registry.public_url = registry.uri();
    config.registry.retries = 0;
    AppContext::from_config(&config).unwrap()
}
