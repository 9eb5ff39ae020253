//! In-process Keystone v2 + Nova stand-in for client tests

use crate::config::OpenStackConfig;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "secret";
pub const REGION: &str = "RegionOne";
const TENANT_PATH: &str = "/v2/tenant";

pub struct NovaTestDaemon {
    handle: JoinHandle<Result<(), hyper::Error>>,
    state: Arc<NovaState>,
}

struct NovaState {
    base_url: String,
    page_size: usize,
    servers: Mutex<Vec<Value>>,
    next_id: AtomicUsize,
    issued: Mutex<Vec<String>>,
    expired: Mutex<HashSet<String>>,
    reject_tokens: AtomicBool,
    requests: Mutex<Vec<String>>,
}

impl NovaTestDaemon {
    /// Serve `servers` as `(id, name, status)`, `page_size` per listing page
    pub async fn start(servers: &[(&str, &str, &str)], page_size: usize) -> Self {
        assert!(page_size > 0);
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(NovaState {
            base_url: format!("http://{}", addr),
            page_size,
            servers: Mutex::new(
                servers
                    .iter()
                    .map(|(id, name, status)| {
                        json!({
                            "id": id,
                            "name": name,
                            "status": status,
                            "OS-EXT-STS:task_state": null
                        })
                    })
                    .collect(),
            ),
            next_id: AtomicUsize::new(servers.len() + 1),
            issued: Mutex::new(Vec::new()),
            expired: Mutex::new(HashSet::new()),
            reject_tokens: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        });

        let service_state = state.clone();
        let make_service = make_service_fn(move |_conn| {
            let state = service_state.clone();
            async move { Ok::<_, Infallible>(service_fn(move |req| handle(state.clone(), req))) }
        });
        let server = Server::from_tcp(listener).unwrap().serve(make_service);

        Self {
            handle: tokio::spawn(server),
            state,
        }
    }

    pub fn config(&self) -> OpenStackConfig {
        self.config_with_password(PASSWORD)
    }

    pub fn config_with_password(&self, password: &str) -> OpenStackConfig {
        OpenStackConfig {
            username: "demo".to_string(),
            password: password.to_string(),
            auth_url: format!("{}/v2.0/", self.state.base_url),
            tenant_name: "demo".to_string(),
            region_name: REGION.to_string(),
        }
    }

    pub fn issued_tokens(&self) -> Vec<String> {
        self.state.issued.lock().unwrap().clone()
    }

    /// Make Nova answer 401 for `token` from now on
    pub fn expire(&self, token: &str) {
        self.state.expired.lock().unwrap().insert(token.to_string());
    }

    pub fn reject_all_tokens(&self) {
        self.state.reject_tokens.store(true, Ordering::SeqCst);
    }

    /// Requests seen so far, as `METHOD path[?query]`
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn server_names(&self) -> Vec<String> {
        self.state
            .servers
            .lock()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

impl Drop for NovaTestDaemon {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle(state: Arc<NovaState>, req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let token = req
        .headers()
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(match &query {
        Some(q) => format!("{} {}?{}", method, path, q),
        None => format!("{} {}", method, path),
    });

    let body = hyper::body::to_bytes(req.into_body())
        .await
        .unwrap_or_default();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    if method == Method::POST && path == "/v2.0/tokens" {
        return Ok(state.issue_token(&body));
    }

    let Some(resource) = path.strip_prefix(TENANT_PATH) else {
        return Ok(not_found(&path));
    };
    if !state.accepts(token.as_deref()) {
        return Ok(reply(
            StatusCode::UNAUTHORIZED,
            json!({"unauthorized": {"code": 401, "message": "Authentication required"}}),
        ));
    }

    let server_id = resource.strip_prefix("/servers/").filter(|id| *id != "detail");
    let response = match (&method, resource, server_id) {
        (&Method::GET, "/servers/detail", _) => state.list_page(query.as_deref()),
        (&Method::POST, "/servers", _) => state.create(&body),
        (&Method::GET, _, Some(id)) => state.show(id),
        (&Method::DELETE, _, Some(id)) => state.delete(id),
        _ => not_found(resource),
    };
    Ok(response)
}

impl NovaState {
    fn issue_token(&self, body: &Value) -> Response<Body> {
        if body["auth"]["passwordCredentials"]["password"] != PASSWORD {
            return reply(
                StatusCode::UNAUTHORIZED,
                json!({"error": {"code": 401, "message": "Invalid user / password"}}),
            );
        }

        let mut issued = self.issued.lock().unwrap();
        let token = format!("tok-{}", issued.len() + 1);
        issued.push(token.clone());

        reply(
            StatusCode::OK,
            json!({"access": {
                "token": {"id": token},
                "serviceCatalog": [{
                    "type": "compute",
                    "name": "nova",
                    "endpoints": [{
                        "region": REGION,
                        "publicURL": format!("{}{}", self.base_url, TENANT_PATH)
                    }]
                }]
            }}),
        )
    }

    fn accepts(&self, token: Option<&str>) -> bool {
        let Some(token) = token else {
            return false;
        };
        !self.reject_tokens.load(Ordering::SeqCst)
            && self.issued.lock().unwrap().iter().any(|t| t == token)
            && !self.expired.lock().unwrap().contains(token)
    }

    /// Nova pages with `marker`; a full page carries a `next` link
    fn list_page(&self, query: Option<&str>) -> Response<Body> {
        let marker = query.and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("marker=")));
        let servers = self.servers.lock().unwrap();

        let start = match marker {
            None => 0,
            Some(marker) => match servers.iter().position(|s| s["id"] == marker) {
                Some(index) => index + 1,
                None => {
                    let message = format!("marker [{}] not found", marker);
                    return reply(
                        StatusCode::BAD_REQUEST,
                        json!({"badRequest": {"code": 400, "message": message}}),
                    );
                }
            },
        };

        let page: Vec<Value> = servers
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();
        let links = match page.last() {
            Some(last) if page.len() == self.page_size => json!([{
                "rel": "next",
                "href": format!(
                    "{}{}/servers/detail?marker={}",
                    self.base_url,
                    TENANT_PATH,
                    last["id"].as_str().unwrap_or_default()
                )
            }]),
            _ => json!([]),
        };

        reply(StatusCode::OK, json!({"servers": page, "servers_links": links}))
    }

    fn create(&self, body: &Value) -> Response<Body> {
        let id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.servers
            .lock()
            .unwrap()
            .push(json!({"id": id, "name": body["server"]["name"], "status": "BUILD"}));
        reply(StatusCode::ACCEPTED, json!({"server": {"id": id}}))
    }

    fn show(&self, id: &str) -> Response<Body> {
        match self.servers.lock().unwrap().iter().find(|s| s["id"] == id) {
            Some(server) => reply(StatusCode::OK, json!({"server": server})),
            None => not_found(id),
        }
    }

    fn delete(&self, id: &str) -> Response<Body> {
        let mut servers = self.servers.lock().unwrap();
        match servers.iter().position(|s| s["id"] == id) {
            Some(index) => {
                servers.remove(index);
                Response::builder()
                    .status(StatusCode::NO_CONTENT)
                    .body(Body::empty())
                    .unwrap()
            }
            None => not_found(id),
        }
    }
}

fn not_found(what: &str) -> Response<Body> {
    reply(
        StatusCode::NOT_FOUND,
        json!({"itemNotFound": {"code": 404, "message": format!("{} could not be found", what)}}),
    )
}

fn reply(status: StatusCode, body: Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
