use crate::app::ports::{Fetcher, HttpRequest, HttpResponse};
use crate::error::{Result, ScraperError};
use metrics::{counter, histogram};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

/// Send a request and turn any non-success status into `ScraperError::Fetch`.
pub async fn fetch_checked(fetcher: &dyn Fetcher, request: &HttpRequest) -> Result<HttpResponse> {
    let t0 = Instant::now();
    let resp = fetcher.send(request).await?;
    histogram!("ods_fetch_duration_seconds").record(t0.elapsed().as_secs_f64());

    if !resp.is_success() {
        counter!("ods_fetch_errors_total").increment(1);
        warn!(url = %request.url, status = resp.status, "Request failed");
        return Err(ScraperError::Fetch {
            url: request.url.clone(),
            status: resp.status,
        });
    }

    counter!("ods_fetch_success_total").increment(1);
    debug!(
        url = %request.url,
        bytes = resp.bytes.len(),
        content_type = %resp.content_type,
        "Fetched payload"
    );
    Ok(resp)
}

pub async fn fetch_json(fetcher: &dyn Fetcher, request: &HttpRequest) -> Result<Value> {
    let resp = fetch_checked(fetcher, request).await?;
    Ok(serde_json::from_slice(&resp.bytes)?)
}

pub async fn fetch_html(fetcher: &dyn Fetcher, url: &str) -> Result<String> {
    let resp = fetch_checked(fetcher, &HttpRequest::get(url)).await?;
    Ok(String::from_utf8_lossy(&resp.bytes).into_owned())
}
