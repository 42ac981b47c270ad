//! Request URL construction.
//!
//! Every request carries `page`. Sort parameters are only sent to endpoints
//! that declare `honors_sort`; the built-in collections do not, and rows
//! come back in server order whatever the table asks for.

use url::Url;

use crate::config::EndpointConfig;
use crate::source::error::FetchError;
use crate::source::types::PageRequest;

pub fn build_page_url(endpoint: &EndpointConfig, request: &PageRequest) -> Result<Url, FetchError> {
    let mut url = Url::parse(&endpoint.url).map_err(|e| {
        FetchError::Permanent(format!("invalid url for endpoint '{}': {}", endpoint.name, e))
    })?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("page", &request.page_index.to_string());
        if endpoint.honors_sort && request.is_sorted() {
            if let Some(order) = request.sort_direction.as_query() {
                query.append_pair("sort", &request.sort_field);
                query.append_pair("order", order);
            }
        }
    }

    Ok(url)
}
