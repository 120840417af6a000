use async_trait::async_trait;
use log::debug;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{Page, PageSource, SourceError};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Parameters for the storefront's `ProductsQuery` operation. The facet
/// values ride in the URL-encoded `variables` JSON of a GET request.
#[derive(Debug, Clone)]
pub struct GraphqlSourceConfig {
    pub endpoint: Url,
    pub page_size: usize,
    pub region_id: String,
    pub sales_channel: u32,
    pub category: String,
    pub category_id: String,
    pub locale: String,
    pub term: String,
    pub sort: String,
}

impl GraphqlSourceConfig {
    pub fn new(endpoint: Url, region_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            page_size: 100,
            region_id: region_id.into(),
            sales_channel: 2,
            category: "bebidas".to_string(),
            category_id: "4599".to_string(),
            locale: "pt-BR".to_string(),
            term: String::new(),
            sort: "score_desc".to_string(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_category(
        mut self,
        category: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        self.category = category.into();
        self.category_id = category_id.into();
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }
}

/// HTTP/GraphQL adapter: pages product names out of the storefront search
/// API. One record per product edge, cursor continuation from `pageInfo`.
pub struct GraphqlProductSource {
    client: Client,
    config: GraphqlSourceConfig,
}

impl GraphqlProductSource {
    pub fn new(config: GraphqlSourceConfig) -> Result<Self, SourceError> {
        let client = ClientBuilder::new().user_agent(DEFAULT_USER_AGENT).build()?;
        Ok(Self { client, config })
    }

    fn query_url(&self, after: &str) -> Url {
        let channel = json!({
            "salesChannel": self.config.sales_channel,
            "regionId": self.config.region_id,
        });
        let variables = json!({
            "isPharmacy": false,
            "first": self.config.page_size,
            "after": after,
            "sort": self.config.sort,
            "term": self.config.term,
            "selectedFacets": [
                { "key": "category-1", "value": self.config.category },
                { "key": "category-1", "value": self.config.category_id },
                { "key": "channel", "value": channel.to_string() },
                { "key": "locale", "value": self.config.locale },
                { "key": "region-id", "value": self.config.region_id },
            ],
        });

        let mut url = self.config.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("operationName", "ProductsQuery")
            .append_pair("variables", &variables.to_string());
        url
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<DataBlock>,
}

#[derive(Debug, Deserialize)]
struct DataBlock {
    search: Option<SearchBlock>,
}

#[derive(Debug, Deserialize)]
struct SearchBlock {
    products: Option<ProductConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductConnection {
    edges: Vec<ProductEdge>,
    page_info: PageInfo,
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProductEdge {
    node: ProductNode,
}

#[derive(Debug, Deserialize)]
struct ProductNode {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[async_trait]
impl PageSource for GraphqlProductSource {
    type Record = String;

    async fn fetch_page(&self, token: &str) -> Result<Page<String>, SourceError> {
        let url = self.query_url(token);
        debug!("GET {url}");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&body)?;
        let products = envelope
            .data
            .and_then(|data| data.search)
            .and_then(|search| search.products)
            .ok_or_else(|| SourceError::Shape("missing data.search.products".to_string()))?;

        Ok(Page {
            records: products
                .edges
                .into_iter()
                .map(|edge| edge.node.name)
                .collect(),
            has_more: products.page_info.has_next_page,
            next_token: products.page_info.end_cursor,
            total_count: products.total_count.map(|count| count as usize),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (GraphqlProductSource, MockServer) {
        let server = MockServer::start().await;
        let endpoint = Url::parse(&server.uri())
            .unwrap()
            .join("/api/graphql")
            .unwrap();
        let config = GraphqlSourceConfig::new(endpoint, "v2.TESTREGION").with_page_size(2);
        let source = GraphqlProductSource::new(config).unwrap();
        (source, server)
    }

    fn products_body(names: &[&str], has_next: bool, cursor: Option<&str>, total: u64) -> serde_json::Value {
        json!({
            "data": {
                "search": {
                    "products": {
                        "edges": names.iter().map(|name| json!({"node": {"name": name}})).collect::<Vec<_>>(),
                        "pageInfo": { "hasNextPage": has_next, "endCursor": cursor },
                        "totalCount": total,
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn decodes_product_page() {
        let (source, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/graphql"))
            .and(query_param("operationName", "ProductsQuery"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(products_body(&["Suco de Uva", "Água Mineral"], true, Some("2"), 37)),
            )
            .mount(&server)
            .await;

        let page = source.fetch_page("0").await.unwrap();
        assert_eq!(page.records, vec!["Suco de Uva", "Água Mineral"]);
        assert!(page.has_more);
        assert_eq!(page.next_token.as_deref(), Some("2"));
        assert_eq!(page.total_count, Some(37));
    }

    #[tokio::test]
    async fn variables_carry_cursor_and_facets() {
        let (source, _server) = setup().await;

        let url = source.query_url("50");
        let variables = url
            .query_pairs()
            .find(|(key, _)| key == "variables")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&variables).unwrap();

        assert_eq!(parsed["after"], "50");
        assert_eq!(parsed["first"], 2);
        assert_eq!(parsed["selectedFacets"][0]["value"], "bebidas");
        assert_eq!(parsed["selectedFacets"][4]["key"], "region-id");
        assert_eq!(parsed["selectedFacets"][4]["value"], "v2.TESTREGION");

        let channel: serde_json::Value =
            serde_json::from_str(parsed["selectedFacets"][2]["value"].as_str().unwrap()).unwrap();
        assert_eq!(channel["salesChannel"], 2);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (source, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/graphql"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = source.fetch_page("0").await.unwrap_err();
        assert!(matches!(err, SourceError::Status(503)));
    }

    #[tokio::test]
    async fn missing_envelope_fields_are_a_shape_error() {
        let (source, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"search": null}})))
            .mount(&server)
            .await;

        let err = source.fetch_page("0").await.unwrap_err();
        assert!(matches!(err, SourceError::Shape(_)));
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let (source, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/graphql"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<!DOCTYPE html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&server)
            .await;

        let err = source.fetch_page("0").await.unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
