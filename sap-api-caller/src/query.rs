//! OData request construction for the two product group entities.

/// Service segment joined between the base URL and the entity name.
pub const SERVICE: &str = "API_PRODUCTGROUP_SRV";

/// One remote read, with the parameters its `$filter` needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestSpec {
    ProductGroup {
        material_group: String,
    },
    ProductGroupText {
        language: String,
        material_group_name: String,
    },
}

impl RequestSpec {
    /// Entity set name, the last path segment of the request URL.
    pub fn api(&self) -> &'static str {
        match self {
            RequestSpec::ProductGroup { .. } => "A_ProductGroup",
            RequestSpec::ProductGroupText { .. } => "A_ProductGroupText",
        }
    }

    /// Tag placed in the `function` field of the published envelope.
    pub fn function(&self) -> &'static str {
        match self {
            RequestSpec::ProductGroup { .. } => "ProductGroupProductGroup",
            RequestSpec::ProductGroupText { .. } => "ProductGroupProductGroupText",
        }
    }

    /// The `$filter` expression. Values are substituted as given; only the
    /// query-string encoding applied when the request is sent escapes them.
    pub fn filter(&self) -> String {
        match self {
            RequestSpec::ProductGroup { material_group } => {
                format!("MaterialGroup eq '{material_group}'")
            }
            RequestSpec::ProductGroupText {
                language,
                material_group_name,
            } => format!(
                "Language eq '{language}' and substringof('{material_group_name}', MaterialGroupName)"
            ),
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        [base_url.trim_end_matches('/'), SERVICE, self.api()].join("/")
    }

    /// Appends the `$filter` parameter to the request's query.
    pub fn apply_query(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.query(&[("$filter", self.filter())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_group_filter() {
        let spec = RequestSpec::ProductGroup {
            material_group: "A001".to_string(),
        };
        assert_eq!(spec.filter(), "MaterialGroup eq 'A001'");
        assert_eq!(spec.api(), "A_ProductGroup");
        assert_eq!(spec.function(), "ProductGroupProductGroup");
    }

    #[test]
    fn test_product_group_text_filter() {
        let spec = RequestSpec::ProductGroupText {
            language: "EN".to_string(),
            material_group_name: "Pumps".to_string(),
        };
        assert_eq!(
            spec.filter(),
            "Language eq 'EN' and substringof('Pumps', MaterialGroupName)"
        );
        assert_eq!(spec.api(), "A_ProductGroupText");
        assert_eq!(spec.function(), "ProductGroupProductGroupText");
    }

    #[test]
    fn test_values_are_not_escaped() {
        let spec = RequestSpec::ProductGroup {
            material_group: "it's".to_string(),
        };
        assert_eq!(spec.filter(), "MaterialGroup eq 'it's'");
    }

    #[test]
    fn test_url_join() {
        let spec = RequestSpec::ProductGroup {
            material_group: "A001".to_string(),
        };
        assert_eq!(
            spec.url("http://host/sap/opu/odata/sap/"),
            "http://host/sap/opu/odata/sap/API_PRODUCTGROUP_SRV/A_ProductGroup"
        );
        assert_eq!(
            spec.url("http://host"),
            "http://host/API_PRODUCTGROUP_SRV/A_ProductGroup"
        );
    }

    #[test]
    fn test_apply_query_encodes_filter() {
        let spec = RequestSpec::ProductGroupText {
            language: "JA".to_string(),
            material_group_name: "a&b".to_string(),
        };
        let client = reqwest::Client::new();
        let request = spec
            .apply_query(client.get(spec.url("http://host")))
            .build()
            .unwrap();

        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![(
                "$filter".to_string(),
                "Language eq 'JA' and substringof('a&b', MaterialGroupName)".to_string()
            )]
        );
    }
}
