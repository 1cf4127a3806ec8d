use crate::calc::error::CostError;
use crate::server::api::{self, ApiError, ServerContext};

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

pub fn route_request(ctx: &ServerContext, method: &str, path: &str, body: &str) -> HttpResponse {
    let path = path.split('?').next().unwrap_or(path);

    if let Some(table_id) = path.strip_prefix("/api/tables/") {
        return match method {
            "GET" => api_result(api::table_detail_payload(ctx, table_id)),
            _ => method_not_allowed(),
        };
    }
    if let Some(table_id) = path.strip_prefix("/api/selections/") {
        return match method {
            "GET" => api_result(api::selections_get_payload(ctx, table_id)),
            "PUT" => api_result(api::selections_put_payload(ctx, table_id, body)),
            _ => method_not_allowed(),
        };
    }

    match (method, path) {
        ("GET", "/") => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "text/html; charset=utf-8",
            body: index_html(),
        },
        ("GET", "/api/health") => json_result(api::health_payload(ctx)),
        ("GET", "/api/tables") => json_result(api::tables_payload(ctx)),
        ("POST", "/api/cost") => api_result(api::cost_payload(ctx, body)),
        ("POST", "/api/compare") => api_result(api::compare_payload(ctx, body)),
        ("GET", "/api/inventory") => json_result(api::inventory_get_payload(ctx)),
        ("PUT", "/api/inventory") => api_result(api::inventory_put_payload(ctx, body)),
        _ => error_response(404, "Not Found", "Route not found"),
    }
}

fn json_ok(payload: String) -> HttpResponse {
    HttpResponse {
        status_code: 200,
        status_text: "OK",
        content_type: "application/json",
        body: payload,
    }
}

fn json_result(result: Result<String, serde_json::Error>) -> HttpResponse {
    match result {
        Ok(payload) => json_ok(payload),
        Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
    }
}

fn api_result(result: Result<String, ApiError>) -> HttpResponse {
    match result {
        Ok(payload) => json_ok(payload),
        Err(err @ ApiError::Parse(_)) => error_response(400, "Bad Request", &err.to_string()),
        Err(ApiError::Validation(errors)) => validation_error_response(
            400,
            "Bad Request",
            api::ValidationErrorResponse {
                status: "error",
                message: "Validation failed",
                errors,
            },
        ),
        Err(ApiError::Cost(err @ CostError::TableNotLoaded(_))) => {
            error_response(404, "Not Found", &err.to_string())
        }
        Err(ApiError::Cost(err)) => error_response(400, "Bad Request", &err.to_string()),
        Err(ApiError::Io(err)) => error_response(500, "Internal Server Error", &err.to_string()),
    }
}

fn method_not_allowed() -> HttpResponse {
    error_response(405, "Method Not Allowed", "Method not allowed for this route")
}

fn validation_error_response(
    status_code: u16,
    status_text: &'static str,
    payload: api::ValidationErrorResponse,
) -> HttpResponse {
    let fallback =
        "{\n  \"status\": \"error\",\n  \"message\": \"Validation failed\"\n}".to_string();

    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: serde_json::to_string_pretty(&payload).unwrap_or(fallback),
    }
}

pub(crate) fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}

fn index_html() -> String {
    r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Frostforge Cost Console</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 900px; margin: 24px auto; padding: 0 12px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    label { display:block; margin: 8px 0 4px; font-weight: 600; }
    select, textarea { width: 100%; padding: 8px; box-sizing: border-box; }
    button { margin-top: 12px; padding: 8px 14px; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 180px; }
  </style>
</head>
<body>
  <h1>Frostforge</h1>
  <p>Upgrade cost totals for gear and charm progressions.</p>

  <div class="card">
    <label for="table">Table</label>
    <select id="table"></select>
    <label for="request">Request body (without <code>table</code>)</label>
    <textarea id="request" rows="8">{ "ranges": [ { "from": 0, "to": 5 } ] }</textarea>
    <button id="cost-btn">POST /api/cost</button>
    <button id="detail-btn">GET /api/tables/{id}</button>
  </div>

  <pre id="output">Ready.</pre>

  <script>
    const output = document.getElementById('output');
    const tableEl = document.getElementById('table');
    const show = (data) => { output.textContent = JSON.stringify(data, null, 2); };

    fetch('/api/tables').then(r => r.json()).then(data => {
      data.tables.forEach(t => {
        const opt = document.createElement('option');
        opt.value = t.id;
        opt.textContent = t.name + ' (' + t.levels + ' levels)';
        tableEl.appendChild(opt);
      });
    });

    document.getElementById('detail-btn').addEventListener('click', async () => {
      const res = await fetch('/api/tables/' + encodeURIComponent(tableEl.value));
      show(await res.json());
    });

    document.getElementById('cost-btn').addEventListener('click', async () => {
      let body;
      try { body = JSON.parse(document.getElementById('request').value); }
      catch (err) { output.textContent = 'Invalid JSON: ' + err; return; }
      body.table = tableEl.value;
      const res = await fetch('/api/cost', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body)
      });
      show(await res.json());
    });
  </script>
</body>
</html>"#
        .to_string()
}
