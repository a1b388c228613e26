// src/scrape/source.rs

use anyhow::{Context, Result};
use rand::Rng;
use reqwest::blocking::Client;
use std::{
    cell::Cell,
    fs,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};
use tracing::{debug, info, trace};
use url::Url;

/// Anything that can hand back the body of a page.
pub trait PageSource {
    fn fetch(&self, url: &Url) -> Result<String>;
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn fetch(&self, url: &Url) -> Result<String> {
        (**self).fetch(url)
    }
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn fetch(&self, url: &Url) -> Result<String> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP source.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("nbacorr/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .timeout(Duration::from_secs(60))
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, url: &Url) -> Result<String> {
        debug!(%url, "GET");
        self.client
            .get(url.clone())
            .send()
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .text()
            .with_context(|| format!("Reading text from {}", url))
    }
}

/// Politeness delay between consecutive fetches.
pub trait Pacer {
    fn pause(&self);
}

impl<P: Pacer + ?Sized> Pacer for &P {
    fn pause(&self) {
        (**self).pause()
    }
}

/// Sleeps a uniformly random duration in `[min, max]`.
pub struct RandomPacer {
    min_secs: f64,
    max_secs: f64,
}

impl RandomPacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        let (lo, hi) = (min.min(max), max.max(min));
        Self {
            min_secs: lo.as_secs_f64(),
            max_secs: hi.as_secs_f64(),
        }
    }
}

impl Pacer for RandomPacer {
    fn pause(&self) {
        let secs = rand::thread_rng().gen_range(self.min_secs..=self.max_secs);
        trace!(secs, "pacing");
        thread::sleep(Duration::from_secs_f64(secs));
    }
}

pub struct NoPacer;

impl Pacer for NoPacer {
    fn pause(&self) {}
}

/// Wraps a source so every fetch after the first is preceded by a pause.
pub struct PacedSource<S, P> {
    inner: S,
    pacer: P,
    fetched: Cell<bool>,
}

impl<S: PageSource, P: Pacer> PacedSource<S, P> {
    pub fn new(inner: S, pacer: P) -> Self {
        Self {
            inner,
            pacer,
            fetched: Cell::new(false),
        }
    }
}

impl<S: PageSource, P: Pacer> PageSource for PacedSource<S, P> {
    fn fetch(&self, url: &Url) -> Result<String> {
        if self.fetched.replace(true) {
            self.pacer.pause();
        }
        self.inner.fetch(url)
    }
}

/// Memoises page bodies on disk, keyed by the last path segment of the URL.
/// The five summary-page families share one page per season, so with a
/// cache in front the network sees each page once.
pub struct CachedSource<S> {
    inner: S,
    dir: PathBuf,
}

impl<S: PageSource> CachedSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("creating cache dir {:?}", dir))?;
        Ok(Self { inner, dir })
    }

    fn path_for(&self, url: &Url) -> PathBuf {
        let name = url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or("index.html");
        self.dir.join(name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl<S: PageSource> PageSource for CachedSource<S> {
    fn fetch(&self, url: &Url) -> Result<String> {
        let path = self.path_for(url);
        if path.is_file() {
            trace!(path = %path.display(), "cache hit");
            return fs::read_to_string(&path).with_context(|| format!("reading {:?}", path));
        }
        let body = self.inner.fetch(url)?;
        fs::write(&path, &body).with_context(|| format!("writing {:?}", path))?;
        info!(%url, path = %path.display(), "cached page");
        Ok(body)
    }
}
