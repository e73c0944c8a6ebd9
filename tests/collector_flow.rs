//! Collector workflow integration tests
//!
//! Runs the full workflow against an in-memory page driver serving fixtures.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use gondola::core::config::WaitConfig;
use gondola::core::{Config, Control, GondolaError, Result};
use gondola::locate::controls::{POSTAL_INPUT_SELECTOR, SUBMIT_BUTTON_SELECTOR};
use gondola::{Collector, PageDriver};

const URL: &str = "https://mercado.carrefour.com.br/bebidas";

const CATEGORY: &str = r#"
<html><body>
  <header>
    <button class="w-[max-content] cusror-pointer flex col-span-2 font-bold hover:underline hover:underline-offset-2" title="Insira seu CEP">Insira seu CEP</button>
  </header>
  <div class="modal">
    <input type="search" name="zipcode" placeholder="00000-000">
    <button type="submit" class="bg-blue-primary hover:bg-blue-primaryHover active:bg-blue-primaryActive text-white text-sm py-2 px-4 rounded-r-md w-[117px] min-w-[117px]">Buscar</button>
  </div>
  <button class="flex items-center justify-center w-[110px] h-[110px] bottom-10 right-10 rounded-full bg-orange fixed z-10"><img alt="Chat"></button>
  <button>Exibir 20 produtos por página</button>
  <ul class="menu"><li><button>20</button></li><li><button>60</button></li></ul>
  <p>Mostrando 1-2 de 3 produtos</p>
  <ul>
    <li data-testid="product-card-container">
      <a data-testid="product-link" href="/cerveja-pilsen-lata/p">Cerveja Pilsen Lata 350ml</a>
      <span data-test-id="price" class="text-blue-royal">R$ 3,79</span>
    </li>
    <li data-testid="product-card-container">
      <a data-testid="product-link" href="/refrigerante-guarana/p">Refrigerante Guaraná 2L</a>
    </li>
  </ul>
</body></html>
"#;

const PAGE_TWO: &str = r#"
<html><body><ul>
  <li data-testid="product-card-container">
    <a data-testid="product-link" href="/vinho-tinto/p">Vinho Tinto Suave 750ml</a>
    <span data-test-id="price">R$ 24,90</span>
  </li>
</ul></body></html>
"#;

/// Serves fixed HTML per URL and records every action
#[derive(Default)]
struct FakeDriver {
    pages: HashMap<String, String>,
    failing_clicks: HashSet<String>,
    failing_urls: HashSet<String>,
    missing_browser_urls: HashSet<String>,
    /// Served instead of the current page once `content()` ran this many times
    later: Option<(usize, String)>,
    content_calls: Mutex<usize>,
    current: Mutex<String>,
    actions: Mutex<Vec<String>>,
}

impl FakeDriver {
    fn new() -> Self {
        let mut pages = HashMap::new();
        pages.insert(URL.to_string(), CATEGORY.to_string());
        pages.insert(format!("{}?page=2", URL), PAGE_TWO.to_string());
        Self {
            pages,
            ..Default::default()
        }
    }

    fn record(&self, action: String) {
        self.actions.lock().unwrap().push(action);
    }

    fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    fn content_calls(&self) -> usize {
        *self.content_calls.lock().unwrap()
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        self.record(format!("goto {}", url));
        if self.missing_browser_urls.contains(url) {
            return Err(GondolaError::AgentBrowserNotFound);
        }
        if self.failing_urls.contains(url) {
            return Err(GondolaError::browser("navigation failed"));
        }
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let calls = {
            let mut calls = self.content_calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if let Some((after, html)) = &self.later {
            if calls > *after {
                return Ok(html.clone());
            }
        }
        let current = self.current.lock().unwrap().clone();
        Ok(self.pages.get(&current).cloned().unwrap_or_default())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.record(format!("click {}", selector));
        if self.failing_clicks.contains(selector) {
            return Err(GondolaError::browser("element not clickable"));
        }
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.record(format!("type {} {}", selector, text));
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.record(format!("fill {} {}", selector, text));
        Ok(())
    }

    async fn eval(&self, _script: &str) -> Result<String> {
        self.record("eval".to_string());
        Ok("1".to_string())
    }

    async fn close(&self) -> Result<()> {
        self.record("close".to_string());
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.target.url = URL.to_string();
    config.target.postal_code = "13403130".to_string();
    config.target.page_size = 2;
    config.target.max_pages = None;
    config.waits = WaitConfig::none();
    config
}

#[tokio::test]
async fn test_full_run_collects_all_pages() {
    let mut collector = Collector::new(FakeDriver::new(), test_config());
    let report = tokio_test::assert_ok!(collector.run().await);

    assert_eq!(report.total_pages, 2);
    let products = report.products();
    let titles: Vec<&str> = products.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Cerveja Pilsen Lata 350ml", "Vinho Tinto Suave 750ml"]);
    assert_eq!(products[1].id, 2);
    assert_eq!(
        products[1].link.as_deref(),
        Some("https://mercado.carrefour.com.br/vinho-tinto/p")
    );

    let totals = report.totals();
    assert_eq!(totals.total, 3);
    assert_eq!(totals.missing_price, 1);
    assert_eq!(totals.complete, 2);
}

#[tokio::test]
async fn test_run_performs_steps_in_order() {
    let mut collector = Collector::new(FakeDriver::new(), test_config());
    tokio_test::assert_ok!(collector.run().await);

    let actions = collector.driver().actions();
    let type_action = format!("type {} 13403130", POSTAL_INPUT_SELECTOR);
    let submit_action = format!("click {}", SUBMIT_BUTTON_SELECTOR);

    let position = |wanted: &str| {
        actions
            .iter()
            .position(|a| a == wanted)
            .unwrap_or_else(|| panic!("missing action {}: {:?}", wanted, actions))
    };

    assert_eq!(actions[0], format!("goto {}", URL));
    assert!(actions[1].starts_with("click html > body"));
    assert_eq!(actions[2], "eval");
    assert!(position(&type_action) < position(&submit_action));
    assert_eq!(
        actions.iter().filter(|a| *a == &format!("goto {}", URL)).count(),
        2
    );
    assert!(position(&format!("goto {}?page=2", URL)) > position(&submit_action));
    assert_eq!(actions.last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn test_missing_postal_button_is_fatal_and_closes_browser() {
    let mut driver = FakeDriver::new();
    driver
        .pages
        .insert(URL.to_string(), "<html><body><p>Manutenção</p></body></html>".to_string());

    let mut collector = Collector::new(driver, test_config());
    let err = tokio_test::assert_err!(collector.run().await);

    assert!(matches!(
        err,
        GondolaError::ElementNotFound(Control::PostalCodeButton)
    ));
    assert_eq!(
        collector.driver().actions().last().map(String::as_str),
        Some("close")
    );
}

#[tokio::test]
async fn test_rejected_click_falls_through_to_next_candidate() {
    let collector_config = test_config();
    let mut driver = FakeDriver::new();
    driver.failing_clicks.insert(SUBMIT_BUTTON_SELECTOR.to_string());

    let collector = Collector::new(driver, collector_config);
    collector.open(URL).await.unwrap();
    tokio_test::assert_ok!(collector.set_postal_code().await);

    let clicks: Vec<String> = collector
        .driver()
        .actions()
        .into_iter()
        .filter(|a| a.starts_with("click"))
        .collect();
    assert_eq!(clicks.len(), 3);
    assert_eq!(clicks[1], format!("click {}", SUBMIT_BUTTON_SELECTOR));
    assert!(clicks[2].starts_with("click html > body"));
}

#[tokio::test]
async fn test_failed_page_is_recorded_empty() {
    let mut driver = FakeDriver::new();
    driver.failing_urls.insert(format!("{}?page=2", URL));

    let mut collector = Collector::new(driver, test_config());
    let report = tokio_test::assert_ok!(collector.run().await);

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.pages[1].page, 2);
    assert!(report.pages[1].products.is_empty());
    assert_eq!(report.pages[1].stats.total, 0);
    assert_eq!(report.products().len(), 1);
}

#[tokio::test]
async fn test_max_pages_caps_the_loop() {
    let mut config = test_config();
    config.target.max_pages = Some(1);

    let mut collector = Collector::new(FakeDriver::new(), config);
    let report = tokio_test::assert_ok!(collector.run().await);

    assert_eq!(report.total_pages, 1);
    assert!(!collector
        .driver()
        .actions()
        .iter()
        .any(|a| a.contains("page=2")));
}

#[tokio::test]
async fn test_page_size_is_selected() {
    let mut config = test_config();
    config.target.page_size = 60;

    let collector = Collector::new(FakeDriver::new(), config);
    collector.open(URL).await.unwrap();
    assert!(tokio_test::assert_ok!(collector.configure_page_size().await));

    let clicks = collector.driver().actions().len();
    assert_eq!(clicks, 3);

    let mut config = test_config();
    config.target.page_size = 100;
    let collector = Collector::new(FakeDriver::new(), config);
    collector.open(URL).await.unwrap();
    assert!(!tokio_test::assert_ok!(collector.configure_page_size().await));
}

#[tokio::test]
async fn test_waits_for_modal_input_to_appear() {
    let modal_start = CATEGORY.find(r#"<div class="modal">"#).unwrap();
    let modal_end = modal_start + CATEGORY[modal_start..].find("</div>").unwrap() + "</div>".len();
    let without_modal = format!("{}{}", &CATEGORY[..modal_start], &CATEGORY[modal_end..]);

    let mut driver = FakeDriver::new();
    driver.pages.insert(URL.to_string(), without_modal);
    driver.later = Some((4, CATEGORY.to_string()));

    let mut config = test_config();
    config.waits.selector_timeout = 5_000;

    let collector = Collector::new(driver, config);
    collector.open(URL).await.unwrap();
    tokio_test::assert_ok!(collector.set_postal_code().await);

    let driver = collector.driver();
    assert!(driver.content_calls() > 4);
    assert!(driver
        .actions()
        .contains(&format!("type {} 13403130", POSTAL_INPUT_SELECTOR)));
}

#[tokio::test]
async fn test_loose_postal_input_is_filled() {
    let loose = CATEGORY.replace(
        r#"<input type="search" name="zipcode" placeholder="00000-000">"#,
        r#"<input type="search" id="inputCep" placeholder="Digite seu CEP">"#,
    );
    let mut driver = FakeDriver::new();
    driver.pages.insert(URL.to_string(), loose);

    let collector = Collector::new(driver, test_config());
    collector.open(URL).await.unwrap();
    tokio_test::assert_ok!(collector.set_postal_code().await);

    let actions = collector.driver().actions();
    assert!(!actions.iter().any(|a| a.starts_with("type")));
    let fill = actions
        .iter()
        .find(|a| a.starts_with("fill"))
        .unwrap_or_else(|| panic!("no fill action: {:?}", actions));
    assert!(fill.starts_with("fill html > body"));
    assert!(fill.ends_with(" 13403130"));
}

#[tokio::test]
async fn test_missing_browser_stops_page_loop() {
    let mut config = test_config();
    config.target.page_size = 1;

    let mut driver = FakeDriver::new();
    driver.missing_browser_urls.insert(format!("{}?page=2", URL));

    let mut collector = Collector::new(driver, config);
    let report = tokio_test::assert_ok!(collector.run().await);

    assert_eq!(report.total_pages, 3);
    assert_eq!(report.pages.len(), 1);
    let actions = collector.driver().actions();
    assert!(!actions.iter().any(|a| a.contains("page=3")));
    assert_eq!(actions.last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn test_implausible_page_count_uses_fallback() {
    let huge = CATEGORY.replace(
        "<p>Mostrando 1-2 de 3 produtos</p>",
        "<p>Página 1 de 9223372036854775807</p>",
    );
    let mut driver = FakeDriver::new();
    driver.pages.insert(URL.to_string(), huge);

    let mut config = test_config();
    config.target.fallback_total_pages = 2;

    let mut collector = Collector::new(driver, config);
    let report = tokio_test::assert_ok!(collector.run().await);

    assert_eq!(report.total_pages, 2);
    assert_eq!(report.pages.len(), 2);
}
