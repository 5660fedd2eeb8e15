use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use wijiwiki::{
    application::{
        auth::{AuthService, LoginThrottle, METRIC_LOGIN_THROTTLED},
        render::default_renderer,
    },
    cache::{
        METRIC_PAGE_CACHE_HIT, METRIC_PAGE_CACHE_MISS, METRIC_PAGE_CACHE_REFRESH,
        METRIC_PAGE_CACHE_REMOVED, PageCache,
    },
    domain::pages::PageName,
    infra::{pages::FsPageStore, users::TomlUserStore},
};

fn counters(recorder: &DebuggingRecorder) -> HashMap<String, u64> {
    recorder
        .snapshotter()
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((key.key().name().to_string(), count)),
            _ => None,
        })
        .collect()
}

#[test]
fn cache_paths_emit_expected_counters() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsPageStore::new(dir.path().to_path_buf()).expect("store");
    let cache = PageCache::new(Arc::new(store), default_renderer());
    let name = PageName::new("metrics").expect("name");
    let path = dir.path().join("metrics.md");

    let recorder = DebuggingRecorder::new();
    metrics::with_local_recorder(&recorder, || {
        fs::write(&path, "# One").expect("write");
        cache.get(&name).expect("miss");
        cache.get(&name).expect("hit");

        fs::write(&path, "# Two").expect("rewrite");
        fs::File::options()
            .write(true)
            .open(&path)
            .and_then(|file| file.set_modified(SystemTime::now() + Duration::from_secs(5)))
            .expect("bump mtime");
        cache.get(&name).expect("refresh");

        fs::remove_file(&path).expect("remove");
        assert!(cache.get(&name).is_err());
    });

    let counts = counters(&recorder);
    for metric in [
        METRIC_PAGE_CACHE_MISS,
        METRIC_PAGE_CACHE_HIT,
        METRIC_PAGE_CACHE_REFRESH,
        METRIC_PAGE_CACHE_REMOVED,
    ] {
        assert_eq!(counts.get(metric), Some(&1), "metric {metric}: {counts:?}");
    }
}

#[test]
fn throttled_logins_are_counted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let users = TomlUserStore::open(dir.path().join("users.toml")).expect("users");
    let window = Duration::from_millis(200);
    let auth = AuthService::new(
        Arc::new(users),
        LoginThrottle::new(1, window),
        Duration::from_secs(60),
    );

    let recorder = DebuggingRecorder::new();
    metrics::with_local_recorder(&recorder, || {
        assert!(auth.admit_login_attempt().is_ok());
        std::thread::sleep(Duration::from_millis(250));
        assert!(auth.admit_login_attempt().is_err());
    });

    assert_eq!(counters(&recorder).get(METRIC_LOGIN_THROTTLED), Some(&1));
}
