//! Collection workflow
//!
//! Drives one linear run: open the category page, set the delivery postal
//! code, pick the page size, then walk every results page.

use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::browser::{hide_elements_script, PageDriver};
use crate::core::config::millis;
use crate::core::{CollectionReport, Config, Control, GondolaError, PageResult, Result};
use crate::locate::controls::{self, Located, Strategy};
use crate::locate::{pagination, Estimate, Page, ProductExtractor};

/// Lower bound on the delay between selector polls
const MIN_POLL_MS: u64 = 10;

/// Runs the collection workflow against a page driver
pub struct Collector<D: PageDriver> {
    driver: D,
    config: Config,
    extractor: ProductExtractor,
}

impl<D: PageDriver> Collector<D> {
    /// Create a collector with the given driver and settings
    pub fn new(driver: D, config: Config) -> Self {
        Self {
            driver,
            config,
            extractor: ProductExtractor::new(),
        }
    }

    /// The underlying driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run every step and close the browser, whatever the outcome
    pub async fn run(&mut self) -> Result<CollectionReport> {
        info!(url = %self.config.target.url, "Start");

        let result = self.collect().await;
        if let Err(e) = &result {
            error!(error = %e, "collection failed");
        }

        debug!("closing browser");
        if let Err(e) = self.driver.close().await {
            warn!(error = %e, "failed to close browser");
        }

        result
    }

    async fn collect(&mut self) -> Result<CollectionReport> {
        let url = self.config.target.url.clone();

        self.open(&url).await?;
        self.set_postal_code().await?;

        debug!(url = %url, "reloading category page");
        self.open(&url).await?;

        match self.configure_page_size().await {
            Ok(true) => info!(
                page_size = self.config.target.page_size,
                "page size configured"
            ),
            Ok(false) => {}
            Err(e) => error!(error = %e, "failed to configure page size"),
        }

        let estimate = self.estimate_pages().await;
        info!(
            pages = estimate.pages,
            method = ?estimate.method,
            "total pages"
        );

        Ok(self.collect_pages(estimate.pages).await)
    }

    /// Navigate and let the page settle
    pub async fn open(&self, url: &str) -> Result<()> {
        debug!(url, "navigating");
        self.driver.goto(url).await?;
        self.pause(self.config.waits.after_load).await;
        Ok(())
    }

    /// Open the postal code modal, enter the code and confirm it
    pub async fn set_postal_code(&self) -> Result<()> {
        let html = self.driver.content().await?;
        let buttons = controls::locate_postal_code_button(&Page::parse(&html, None));
        self.click_first(Control::PostalCodeButton, &buttons).await?;

        debug!("waiting for postal code modal");
        self.pause(self.config.waits.after_postal_button).await;

        self.hide_chat_widget().await;

        let html = self.wait_for(controls::POSTAL_INPUT_SELECTOR).await?;
        let inputs = controls::locate_postal_code_input(&Page::parse(&html, None));
        self.enter_postal_code(&inputs).await?;

        let html = self.wait_for(controls::SUBMIT_BUTTON_SELECTOR).await?;
        let submits = controls::locate_submit_button(&Page::parse(&html, None));
        self.click_first(Control::SubmitButton, &submits).await?;

        debug!("waiting for postal code update");
        self.pause(self.config.waits.after_postal_submit).await;
        Ok(())
    }

    /// Hide the floating chat widget so it cannot intercept clicks
    ///
    /// Returns how many elements were hidden. Failures are only logged.
    pub async fn hide_chat_widget(&self) -> usize {
        let html = match self.driver.content().await {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "failed to read page while hiding chat widget");
                return 0;
            }
        };

        let widgets = controls::locate_chat_widget(&Page::parse(&html, None));
        let Some(first) = widgets.first() else {
            info!("chat widget not found");
            return 0;
        };

        let selectors: Vec<String> = widgets.iter().map(|w| w.selector.clone()).collect();
        match self.driver.eval(&hide_elements_script(&selectors)).await {
            Ok(output) => {
                let hidden = output.trim().parse().unwrap_or(selectors.len());
                info!(hidden, strategy = %first.strategy, "chat widget hidden");
                hidden
            }
            Err(e) => {
                error!(error = %e, "failed to hide chat widget");
                0
            }
        }
    }

    /// Switch the listing to the configured number of products per page
    ///
    /// `Ok(false)` means the controls were not on the page.
    pub async fn configure_page_size(&self) -> Result<bool> {
        let page_size = self.config.target.page_size;

        let html = self.driver.content().await?;
        let Some(control) = controls::locate_page_size_control(&Page::parse(&html, None)) else {
            warn!("page size control not found");
            return Ok(false);
        };

        debug!(selector = %control.selector, "opening page size menu");
        self.driver.click(&control.selector).await?;
        self.pause(self.config.waits.after_menu_open).await;

        let html = self.driver.content().await?;
        let Some(option) = controls::locate_page_size_option(&Page::parse(&html, None), page_size)
        else {
            warn!(page_size, "page size option not found");
            return Ok(false);
        };

        self.driver.click(&option.selector).await?;
        self.pause(self.config.waits.after_page_size).await;
        Ok(true)
    }

    /// Estimate the number of result pages from the current page
    pub async fn estimate_pages(&self) -> Estimate {
        let target = &self.config.target;
        debug!("estimating total pages");

        let estimate = match self.driver.content().await {
            Ok(html) => pagination::estimate_total_pages(
                &Page::parse(&html, None),
                target.page_size,
                target.fallback_total_pages,
            ),
            Err(e) => {
                error!(error = %e, "failed to read page for pagination");
                Estimate::fallback(target.fallback_total_pages)
            }
        };

        estimate
            .bounded(target.page_ceiling, target.fallback_total_pages)
            .capped(target.max_pages)
    }

    /// Visit pages `1..=total` and extract their products
    ///
    /// A page that fails to load is logged and recorded with empty stats.
    /// Errors that would fail every later page end the loop early.
    pub async fn collect_pages(&mut self, total: usize) -> CollectionReport {
        let mut report = CollectionReport {
            total_pages: total,
            pages: Vec::new(),
        };

        for page in 1..=total {
            info!(page, total, "processing page");
            match self.collect_page(page).await {
                Ok(result) => {
                    debug!(page, products = result.products.len(), "page collected");
                    report.pages.push(result);
                }
                Err(e) if e.is_fatal() => {
                    error!(page, error = %e, "stopping page loop");
                    break;
                }
                Err(e) => {
                    warn!(page, error = %e, "page skipped");
                    report.pages.push(PageResult {
                        page,
                        ..Default::default()
                    });
                }
            }
        }

        report
    }

    async fn collect_page(&mut self, page: usize) -> Result<PageResult> {
        let url = self.config.page_url(page)?;
        if page > 1 {
            self.open(&url).await?;
        }

        let html = self.driver.content().await?;
        let snapshot = Page::parse(&html, Some(&url));
        Ok(self.extractor.extract_page(&snapshot, page))
    }

    /// Try candidates in order until the browser accepts a click
    async fn click_first(&self, control: Control, candidates: &[Located]) -> Result<Located> {
        for candidate in candidates {
            match self.driver.click(&candidate.selector).await {
                Ok(()) => {
                    info!(%control, strategy = %candidate.strategy, "clicked");
                    return Ok(candidate.clone());
                }
                Err(e) => warn!(
                    %control,
                    selector = %candidate.selector,
                    error = %e,
                    "click failed, trying next strategy"
                ),
            }
        }

        error!(%control, "not found");
        Err(GondolaError::ElementNotFound(control))
    }

    /// Type into the exact input, or fill whichever looser match was found
    async fn enter_postal_code(&self, candidates: &[Located]) -> Result<()> {
        let cep = &self.config.target.postal_code;

        for candidate in candidates {
            let attempt = match candidate.strategy {
                Strategy::SiteSelector => self.driver.type_text(&candidate.selector, cep).await,
                _ => self.driver.fill(&candidate.selector, cep).await,
            };
            match attempt {
                Ok(()) => {
                    info!(strategy = %candidate.strategy, "postal code input found");
                    debug!(cep = %cep, "postal code entered");
                    return Ok(());
                }
                Err(e) => warn!(
                    selector = %candidate.selector,
                    error = %e,
                    "postal code input rejected, trying next strategy"
                ),
            }
        }

        error!("postal code input not found");
        Err(GondolaError::ElementNotFound(Control::PostalCodeInput))
    }

    /// Poll until a selector appears or the timeout passes
    ///
    /// Returns the last snapshot either way, so fallbacks can run on it.
    async fn wait_for(&self, selector: &str) -> Result<String> {
        let waits = &self.config.waits;
        let deadline = Instant::now() + millis(waits.selector_timeout);

        loop {
            let html = self.driver.content().await?;
            if Page::parse(&html, None).exists(selector) {
                return Ok(html);
            }
            if Instant::now() >= deadline {
                debug!(selector, "selector did not appear, falling back");
                return Ok(html);
            }
            sleep(millis(waits.poll_interval.max(MIN_POLL_MS))).await;
        }
    }

    async fn pause(&self, ms: u64) {
        if ms > 0 {
            sleep(millis(ms)).await;
        }
    }
}
