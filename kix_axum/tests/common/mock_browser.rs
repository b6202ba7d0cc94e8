use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Response, header};
use tower::ServiceExt;

/// Drives a router in-process, carrying the session cookie from one
/// response to the next request like a browser would.
pub struct MockBrowser {
    app: Router,
    cookie_name: String,
    cookie: Option<String>,
}

impl MockBrowser {
    pub fn new(app: Router) -> Self {
        Self {
            app,
            cookie_name: "session".to_string(),
            cookie: None,
        }
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn set_cookie(&mut self, value: &str) {
        self.cookie = Some(format!("{}={}", self.cookie_name, value));
    }

    pub async fn get(&mut self, path: &str) -> Response<Body> {
        self.send(Method::GET, path, HeaderMap::new(), Body::empty())
            .await
    }

    pub async fn post(&mut self, path: &str, headers: HeaderMap) -> Response<Body> {
        self.send(Method::POST, path, headers, Body::empty()).await
    }

    pub async fn post_form(&mut self, path: &str, form: &str) -> Response<Body> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded".parse().unwrap(),
        );
        self.send(Method::POST, path, headers, Body::from(form.to_string()))
            .await
    }

    pub async fn send(
        &mut self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Body,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        self.store_cookies(response.headers());
        response
    }

    fn store_cookies(&mut self, headers: &HeaderMap) {
        let prefix = format!("{}=", self.cookie_name);
        for value in headers.get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            if !value.starts_with(&prefix) {
                continue;
            }
            if value.contains("Max-Age=-1") {
                self.cookie = None;
            } else {
                self.cookie = Some(value.split(';').next().unwrap().to_string());
            }
        }
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Every `Set-Cookie` header of a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}
