//! PubMed metadata client using the NCBI E-utilities API.

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{ArticleBuilder, ArticleMetadata};
use crate::sources::{MetadataSource, SourceError};
use crate::utils::HttpClient;

/// E-utilities base URL
const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// PubMed metadata client
///
/// Wraps `esearch.fcgi` (identifier search) and `efetch.fcgi` (record
/// fetch). The configured NCBI API key is appended to every request when
/// present.
#[derive(Debug, Clone)]
pub struct PubMedClient {
    client: Arc<HttpClient>,
    api_key: Option<String>,
    base_url: String,
}

impl PubMedClient {
    /// Create a new PubMed client
    pub fn new(api_key: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            api_key,
            base_url: EUTILS_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different E-utilities base (for testing)
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the esearch query string
    fn build_search_url(&self, term: &str, retmax: usize) -> String {
        let mut params = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("term".to_string(), term.to_string()),
            ("retmax".to_string(), retmax.to_string()),
            ("retmode".to_string(), "xml".to_string()),
        ];

        if let Some(key) = &self.api_key {
            params.push(("api_key".to_string(), key.clone()));
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/esearch.fcgi?{}", self.base_url, query)
    }

    /// Build the efetch URL for a single PubMed ID
    fn build_fetch_url(&self, pmid: &str) -> String {
        let mut url = format!(
            "{}/efetch.fcgi?db=pubmed&id={}&retmode=xml",
            self.base_url,
            urlencoding::encode(pmid)
        );
        if let Some(key) = &self.api_key {
            url.push_str(&format!("&api_key={}", urlencoding::encode(key)));
        }
        url
    }

    /// Issue one smoke-test search to verify connectivity and the API key.
    ///
    /// Returns the leading bytes of the response for display.
    pub async fn ping(&self) -> Result<String, SourceError> {
        let url = self.build_search_url("genetics", 1);
        let xml = self.get_xml(&url, "reach PubMed").await?;
        Ok(xml.chars().take(200).collect())
    }

    async fn get_xml(&self, url: &str, what: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to {}: {}", what, e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimit);
        }

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "PubMed API returned status: {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))
    }

    /// Parse the esearch response XML into an ordered PMID list
    fn parse_search_response(xml: &str) -> Result<Vec<String>, SourceError> {
        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct ESearchResult {
            IdList: Option<IdList>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct IdList {
            #[serde(rename = "Id", default)]
            ids: Vec<String>,
        }

        let result: ESearchResult = from_str(xml)
            .map_err(|e| SourceError::Parse(format!("Failed to parse PubMed search XML: {}", e)))?;

        Ok(result.IdList.map(|l| l.ids).unwrap_or_default())
    }

    /// Parse the efetch response XML into article metadata
    fn parse_fetch_response(xml: &str, pmid: &str) -> Result<ArticleMetadata, SourceError> {
        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct PubmedArticleSet {
            #[serde(rename = "PubmedArticle", default)]
            articles: Vec<PubmedArticle>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct PubmedArticle {
            MedlineCitation: Option<MedlineCitation>,
            PubmedData: Option<PubmedData>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct MedlineCitation {
            PMID: Option<Pmid>,
            Article: Option<Article>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct Pmid {
            #[serde(rename = "$text")]
            id: String,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct Article {
            Journal: Option<Journal>,
            ArticleTitle: Option<ArticleTitle>,
            Abstract: Option<Abstract>,
            AuthorList: Option<AuthorList>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct Journal {
            Title: Option<JournalTitle>,
            JournalIssue: Option<JournalIssue>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct JournalTitle {
            #[serde(rename = "$text")]
            title: String,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct JournalIssue {
            PubDate: Option<PubDate>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct PubDate {
            Year: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct ArticleTitle {
            #[serde(rename = "$text")]
            title: String,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct Abstract {
            #[serde(rename = "AbstractText", default)]
            abstract_texts: Vec<AbstractText>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct AbstractText {
            #[serde(rename = "$text")]
            text: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct AuthorList {
            #[serde(rename = "Author", default)]
            authors: Vec<Author>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct Author {
            LastName: Option<NameText>,
            ForeName: Option<NameText>,
            CollectiveName: Option<NameText>,
        }

        #[derive(Debug, Deserialize)]
        struct NameText {
            #[serde(rename = "$text")]
            name: String,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct PubmedData {
            ArticleIdList: Option<ArticleIdList>,
        }

        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct ArticleIdList {
            #[serde(rename = "ArticleId", default)]
            ids: Vec<ArticleId>,
        }

        #[derive(Debug, Deserialize)]
        struct ArticleId {
            #[serde(rename = "@IdType")]
            id_type: String,
            #[serde(rename = "$text")]
            value: Option<String>,
        }

        let result: PubmedArticleSet = from_str(xml)
            .map_err(|e| SourceError::Parse(format!("Failed to parse PubMed fetch XML: {}", e)))?;

        let article = result
            .articles
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(format!("No PubMed record for {}", pmid)))?;

        let record_pmid = article
            .MedlineCitation
            .as_ref()
            .and_then(|m| m.PMID.as_ref())
            .map(|p| p.id.clone())
            .unwrap_or_else(|| pmid.to_string());

        let title = article
            .MedlineCitation
            .as_ref()
            .and_then(|m| m.Article.as_ref())
            .and_then(|a| a.ArticleTitle.as_ref())
            .map(|t| t.title.clone())
            .unwrap_or_default();

        let journal = article
            .MedlineCitation
            .as_ref()
            .and_then(|m| m.Article.as_ref())
            .and_then(|a| a.Journal.as_ref())
            .and_then(|j| j.Title.as_ref())
            .map(|t| t.title.clone())
            .unwrap_or_default();

        let authors = article
            .MedlineCitation
            .as_ref()
            .and_then(|m| m.Article.as_ref())
            .and_then(|a| a.AuthorList.as_ref())
            .map(|al| {
                al.authors
                    .iter()
                    .filter_map(|author| {
                        if let Some(collective) = &author.CollectiveName {
                            return Some(collective.name.clone());
                        }
                        let first = author
                            .ForeName
                            .as_ref()
                            .map(|f| f.name.as_str())
                            .unwrap_or("");
                        let last = author
                            .LastName
                            .as_ref()
                            .map(|l| l.name.as_str())
                            .unwrap_or("");
                        let full = format!("{} {}", first, last).trim().to_string();
                        if full.is_empty() {
                            None
                        } else {
                            Some(full)
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let abstract_text = article
            .MedlineCitation
            .as_ref()
            .and_then(|m| m.Article.as_ref())
            .and_then(|a| a.Abstract.as_ref())
            .map(|ab| {
                ab.abstract_texts
                    .iter()
                    .filter_map(|at| at.text.clone())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let year = article
            .MedlineCitation
            .as_ref()
            .and_then(|m| m.Article.as_ref())
            .and_then(|a| a.Journal.as_ref())
            .and_then(|j| j.JournalIssue.as_ref())
            .and_then(|ji| ji.PubDate.as_ref())
            .and_then(|pd| pd.Year.as_ref())
            .and_then(|y| y.parse::<i32>().ok());

        let doi = article
            .PubmedData
            .as_ref()
            .and_then(|pd| pd.ArticleIdList.as_ref())
            .and_then(|ail| ail.ids.iter().find(|id| id.id_type == "doi"))
            .and_then(|id| id.value.clone());

        let mut builder = ArticleBuilder::new(record_pmid, title)
            .journal(journal)
            .authors(authors)
            .abstract_text(abstract_text);
        if let Some(year) = year {
            builder = builder.year(year);
        }
        if let Some(doi) = doi {
            builder = builder.doi(doi);
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl MetadataSource for PubMedClient {
    fn id(&self) -> &str {
        "pubmed"
    }

    async fn article_by_pmid(&self, pmid: &str) -> Result<ArticleMetadata, SourceError> {
        if pmid.trim().is_empty() {
            return Err(SourceError::InvalidRequest("Empty PMID".to_string()));
        }

        let url = self.build_fetch_url(pmid);
        let xml = self.get_xml(&url, "fetch PubMed record").await?;
        Self::parse_fetch_response(&xml, pmid)
    }

    async fn pmids_for_query(
        &self,
        term: &str,
        retmax: usize,
    ) -> Result<Vec<String>, SourceError> {
        if term.trim().is_empty() {
            return Err(SourceError::InvalidRequest("Empty query".to_string()));
        }

        let url = self.build_search_url(term, retmax);
        let xml = self.get_xml(&url, "search PubMed").await?;
        Self::parse_search_response(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSearchResult>
  <Count>2</Count>
  <RetMax>2</RetMax>
  <IdList>
    <Id>31452104</Id>
    <Id>29541022</Id>
  </IdList>
</eSearchResult>"#;

    const FETCH_XML: &str = r#"<?xml version="1.0" ?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE">
      <PMID Version="1">31452104</PMID>
      <Article PubModel="Print">
        <Journal>
          <Title>Journal of Clinical Oncology</Title>
          <JournalIssue>
            <PubDate><Year>2019</Year><Month>Aug</Month></PubDate>
          </JournalIssue>
        </Journal>
        <ArticleTitle>Targeted therapy in leukemia.</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">First part.</AbstractText>
          <AbstractText Label="RESULTS">Second part.</AbstractText>
        </Abstract>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y">
            <LastName>Smith</LastName>
            <ForeName>Jane</ForeName>
            <Initials>J</Initials>
          </Author>
          <Author ValidYN="Y">
            <CollectiveName>Leukemia Study Group</CollectiveName>
          </Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">31452104</ArticleId>
        <ArticleId IdType="doi">10.1200/jco.19.01234</ArticleId>
      </ArticleIdList>
    </PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_build_search_url() {
        let client = PubMedClient::new(Some("secret".to_string())).unwrap();
        let url = client.build_search_url("machine learning", 5);

        assert!(url.contains("esearch.fcgi"));
        assert!(url.contains("db=pubmed"));
        assert!(url.contains("term=machine%20learning"));
        assert!(url.contains("retmax=5"));
        assert!(url.contains("retmode=xml"));
        assert!(url.contains("api_key=secret"));
    }

    #[test]
    fn test_build_search_url_without_key() {
        let client = PubMedClient::new(None).unwrap();
        let url = client.build_search_url("cancer", 1);
        assert!(!url.contains("api_key"));
    }

    #[test]
    fn test_parse_search_response() {
        let ids = PubMedClient::parse_search_response(SEARCH_XML).unwrap();
        assert_eq!(ids, vec!["31452104", "29541022"]);
    }

    #[test]
    fn test_parse_search_response_empty() {
        let xml = r#"<eSearchResult><Count>0</Count><IdList></IdList></eSearchResult>"#;
        let ids = PubMedClient::parse_search_response(xml).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_parse_fetch_response() {
        let article = PubMedClient::parse_fetch_response(FETCH_XML, "31452104").unwrap();

        assert_eq!(article.pmid, "31452104");
        assert_eq!(article.title, "Targeted therapy in leukemia.");
        assert_eq!(article.journal, "Journal of Clinical Oncology");
        assert_eq!(article.year, Some(2019));
        assert_eq!(
            article.authors,
            vec!["Jane Smith".to_string(), "Leukemia Study Group".to_string()]
        );
        assert_eq!(article.abstract_text, "First part. Second part.");
        assert_eq!(article.doi, Some("10.1200/jco.19.01234".to_string()));
    }

    #[test]
    fn test_parse_fetch_response_no_record() {
        let xml = r#"<PubmedArticleSet></PubmedArticleSet>"#;
        let err = PubMedClient::parse_fetch_response(xml, "1").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/esearch.fcgi")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(SEARCH_XML)
            .create_async()
            .await;

        let client = PubMedClient::new(None)
            .unwrap()
            .with_base_url(server.url());
        let ids = client.pmids_for_query("leukemia", 2).await.unwrap();

        assert_eq!(ids.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_server_error_maps_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/efetch.fcgi")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = PubMedClient::new(None)
            .unwrap()
            .with_base_url(server.url());
        let err = client.article_by_pmid("31452104").await.unwrap_err();
        assert!(matches!(err, SourceError::Api(_)));
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let client = PubMedClient::new(None).unwrap();
        let err = client.pmids_for_query("  ", 1).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidRequest(_)));
    }
}
