use serde_json::{json, Value};
use zing::{from_fn, App, Config, Flow, HandlerError, RouteRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    // Worker threads follow the configuration, CPU count otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        println!("[CONFIG] Using {workers} worker threads");
    } else {
        println!("[CONFIG] Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(cfg);

    app.register_sync("sum", sum)
        .register_sync("get_user", get_user)
        .register_sync("create_user", create_user)
        .register_async("delete_user", delete_user);

    app.use_middleware(from_fn("request-log", |ctx| {
        println!("Request: {} {}", ctx.method, ctx.url);
        Flow::Proceed
    }));

    app.on("customEvent", |data| println!("Received event: {data}"));
    app.on("server:ready", |data| {
        println!("Server running on http://{}", data["address"].as_str().unwrap_or("?"));
    });
    app.emit("customEvent", &json!({ "message": "Hello from Zing!" }));

    app.listen().await?;
    Ok(())
}

fn sum(req: RouteRequest) -> Value {
    let parse = |key| req.query(key).and_then(|v| v.trim().parse::<i64>().ok());
    match (parse("num1"), parse("num2")) {
        (Some(a), Some(b)) => a.checked_add(b).map_or_else(
            || json!({ "error": "Invalid numbers provided" }),
            |sum| json!({ "sum": sum }),
        ),
        _ => json!({ "error": "Invalid numbers provided" }),
    }
}

fn get_user(req: RouteRequest) -> Value {
    json!({ "message": "Fetching user", "id": req.param("id") })
}

fn create_user(req: RouteRequest) -> Value {
    json!({ "message": "Creating user", "data": req.body })
}

async fn delete_user(req: RouteRequest) -> Result<Value, HandlerError> {
    match req.param("id") {
        Some(id) => Ok(json!({ "message": "Deleting user", "id": id })),
        None => Err(HandlerError::new("missing user id")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zing::routing::HttpMethod;

    fn request(url: &str, params: &[(&str, &str)], body: Value) -> RouteRequest {
        let (path, query) = zing::http::split_url(url);
        RouteRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            path,
            query,
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            body,
            headers: hyper::HeaderMap::new(),
            remote_addr: None,
        }
    }

    fn sum_of(url: &str) -> Value {
        sum(request(url, &[], json!({})))
    }

    #[test]
    fn test_sum() {
        assert_eq!(sum_of("/api/v1/sum?num1=3&num2=4"), json!({ "sum": 7 }));
        assert_eq!(sum_of("/api/v1/sum?num1=-3&num2=4"), json!({ "sum": 1 }));
        // surrounding whitespace is tolerated
        assert_eq!(sum_of("/api/v1/sum?num1=+3+&num2=4"), json!({ "sum": 7 }));
    }

    #[test]
    fn test_sum_rejects_invalid_input() {
        let invalid = json!({ "error": "Invalid numbers provided" });
        assert_eq!(sum_of("/api/v1/sum?num1=a&num2=4"), invalid);
        assert_eq!(sum_of("/api/v1/sum?num1=3"), invalid);
        assert_eq!(sum_of("/api/v1/sum?num1=1.5&num2=4"), invalid);
        assert_eq!(
            sum_of(&format!("/api/v1/sum?num1={}&num2=1", i64::MAX)),
            invalid
        );
    }

    #[test]
    fn test_user_handlers() {
        let value = get_user(request("/user/42", &[("id", "42")], json!({})));
        assert_eq!(value, json!({ "message": "Fetching user", "id": "42" }));

        let value = get_user(request("/api/v1/user", &[], json!({})));
        assert_eq!(value, json!({ "message": "Fetching user", "id": null }));

        let value = create_user(request("/api/v1/user", &[], json!({ "name": "ada" })));
        assert_eq!(
            value,
            json!({ "message": "Creating user", "data": { "name": "ada" } })
        );
    }

    #[tokio::test]
    async fn test_delete_user() {
        let value = delete_user(request("/user/7", &[("id", "7")], json!({})))
            .await
            .unwrap();
        assert_eq!(value, json!({ "message": "Deleting user", "id": "7" }));

        let err = delete_user(request("/user", &[], json!({}))).await.unwrap_err();
        assert_eq!(err.to_string(), "missing user id");
    }
}
