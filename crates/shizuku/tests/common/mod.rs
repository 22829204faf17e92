use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use bytes::Bytes;
use reqwest::StatusCode;
use shizuku::{hls::Segment, Fetcher, ShizukuError, ShizukuResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Started(String),
    Finished(String),
}

enum Route {
    Body(Bytes, Duration),
    Status(StatusCode, Duration),
    Flaky { failures: AtomicUsize, body: Bytes },
}

/// In-memory fetcher recording every request it serves.
///
/// Unknown urls answer with `404 Not Found`.
#[derive(Default)]
pub struct FakeFetcher {
    routes: HashMap<String, Route>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.body_with_delay(url, body, Duration::ZERO)
    }

    pub fn body_with_delay(
        mut self,
        url: impl Into<String>,
        body: impl Into<Bytes>,
        delay: Duration,
    ) -> Self {
        self.routes.insert(url.into(), Route::Body(body.into(), delay));
        self
    }

    pub fn status(self, url: impl Into<String>, status: StatusCode) -> Self {
        self.status_with_delay(url, status, Duration::ZERO)
    }

    pub fn status_with_delay(
        mut self,
        url: impl Into<String>,
        status: StatusCode,
        delay: Duration,
    ) -> Self {
        self.routes.insert(url.into(), Route::Status(status, delay));
        self
    }

    /// Fails `failures` times with `500` before serving `body`.
    pub fn flaky(
        mut self,
        url: impl Into<String>,
        failures: usize,
        body: impl Into<Bytes>,
    ) -> Self {
        self.routes.insert(
            url.into(),
            Route::Flaky {
                failures: AtomicUsize::new(failures),
                body: body.into(),
            },
        );
        self
    }

    /// Serve `count` segments named `{prefix}{i}.ts` with payload `{payload}{i}`.
    pub fn segments(mut self, prefix: &str, payload: &str, count: usize, delay: Duration) -> Self {
        for i in 0..count {
            self = self.body_with_delay(format!("{prefix}{i}.ts"), format!("{payload}{i}"), delay);
        }
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Started(url) => Some(url),
                Call::Finished(_) => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Fetcher for FakeFetcher {
    async fn fetch_segment(&self, url: &str) -> ShizukuResult<Bytes> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.record(Call::Started(url.to_string()));

        let result = match self.routes.get(url) {
            Some(Route::Body(body, delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(body.clone())
            }
            Some(Route::Status(status, delay)) => {
                tokio::time::sleep(*delay).await;
                Err(ShizukuError::HttpError(*status))
            }
            Some(Route::Flaky { failures, body }) => {
                let failed = failures
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
                if failed {
                    Err(ShizukuError::HttpError(StatusCode::INTERNAL_SERVER_ERROR))
                } else {
                    Ok(body.clone())
                }
            }
            None => Err(ShizukuError::HttpError(StatusCode::NOT_FOUND)),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(Call::Finished(url.to_string()));
        result
    }
}

/// Shares one fake between the code under test and the assertions.
pub fn shared(fetcher: FakeFetcher) -> Arc<FakeFetcher> {
    Arc::new(fetcher)
}

pub fn segment_list(prefix: &str, count: usize) -> Vec<Segment> {
    (0..count)
        .map(|index| Segment {
            index,
            duration: 4.,
            url: format!("{prefix}{index}.ts"),
        })
        .collect()
}

/// A finished media playlist with `count` segments named `{name}{i}.ts`.
pub fn media_playlist(name: &str, count: usize) -> String {
    let mut playlist = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXT-X-VERSION:3\n");
    for i in 0..count {
        playlist.push_str(&format!("#EXTINF:4.000,\n{name}{i}.ts\n"));
    }
    playlist.push_str("#EXT-X-ENDLIST\n");
    playlist
}

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("shizuku=debug")
        .with_test_writer()
        .try_init();
}
