use std::{ops::Deref, sync::Arc};

use reqwest::{Client, ClientBuilder, IntoUrl};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};

use crate::error::ShizukuResult;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    cookies_store: Arc<CookieStoreMutex>,
}

impl HttpClient {
    pub fn new(builder: ClientBuilder) -> ShizukuResult<Self> {
        let cookies_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let client = builder.cookie_provider(cookies_store.clone()).build()?;

        Ok(Self {
            client,
            cookies_store,
        })
    }

    /// Add `Set-Cookie` style strings to the cookie jar, scoped to `url`.
    ///
    /// Malformed cookies are ignored.
    pub fn add_cookies<S>(
        &self,
        cookies: impl IntoIterator<Item = S>,
        url: impl IntoUrl,
    ) -> ShizukuResult<()>
    where
        S: AsRef<str>,
    {
        let url = url.into_url()?;
        let mut lock = match self.cookies_store.lock() {
            Ok(lock) => lock,
            Err(poisoned) => poisoned.into_inner(),
        };
        for cookie in cookies {
            _ = lock.parse(cookie.as_ref(), &url);
        }
        Ok(())
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(Client::builder()).expect("failed to build the default http client")
    }
}

impl Deref for HttpClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
