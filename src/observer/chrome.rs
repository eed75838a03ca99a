use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{Result, SocialcastError};
use crate::observer::{BrowserConfig, MutationBatch, MutationSource};

/// Name of the page-side function the observer script reports through.
pub const BINDING: &str = "__socialcastBatch";

/// Injected into the watched page. Reports the current body once, then the
/// outer HTML of every element added under it. Reported nodes are marked so
/// a subtree is never sent twice.
const OBSERVER_SCRIPT: &str = r#"
(() => {
  if (window.__socialcastObserver) return true;
  const MARK = 'data-socialcast-seen';
  const report = (nodes) => {
    const html = [];
    for (const node of nodes) {
      if (node.nodeType !== Node.ELEMENT_NODE || node.hasAttribute(MARK)) continue;
      html.push(node.outerHTML);
      node.setAttribute(MARK, '');
    }
    if (html.length > 0) window.__socialcastBatch(JSON.stringify(html));
  };
  const observer = new MutationObserver((mutations) => {
    const added = [];
    for (const m of mutations) added.push(...m.addedNodes);
    report(added);
  });
  report([document.body]);
  observer.observe(document.body, { childList: true, subtree: true });
  window.__socialcastObserver = observer;
  return true;
})()
"#;

/// Mutation source backed by a Chrome page driven over CDP.
pub struct ChromeMutationSource {
    _browser: Browser,
    handler: JoinHandle<()>,
    _page: Page,
    events: EventStream<EventBindingCalled>,
    page_url: String,
}

fn browser_err(context: &str) -> impl Fn(chromiumoxide::error::CdpError) -> SocialcastError + '_ {
    move |e| SocialcastError::Browser(format!("{}: {}", context, e))
}

impl ChromeMutationSource {
    /// Launch a browser, open `url`, and install the mutation observer.
    pub async fn launch(config: &BrowserConfig, url: &str) -> Result<Self> {
        let mut builder = ChromeConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        for arg in &config.extra_args {
            builder = builder.arg(arg.as_str());
        }
        if !config.headless {
            builder = builder.with_head();
        }

        let chrome_config = builder
            .build()
            .map_err(|e| SocialcastError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(chrome_config).await.map_err(|e| {
            SocialcastError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler: {}", e);
                }
            }
        });

        let page = browser
            .new_page(url)
            .await
            .map_err(browser_err("Failed to create page"))?;

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(browser_err("Failed to set user agent"))?;
        }

        page.wait_for_navigation()
            .await
            .map_err(browser_err("Navigation failed"))?;

        // Feeds render asynchronously after load.
        tokio::time::sleep(config.wait_after_load()).await;

        let events = page
            .event_listener::<EventBindingCalled>()
            .await
            .map_err(browser_err("Failed to listen for binding calls"))?;
        page.execute(AddBindingParams::new(BINDING))
            .await
            .map_err(browser_err("Failed to add page binding"))?;
        page.evaluate(OBSERVER_SCRIPT)
            .await
            .map_err(browser_err("Failed to install mutation observer"))?;

        info!("Observing {}", url);

        Ok(Self {
            _browser: browser,
            handler,
            _page: page,
            events,
            page_url: url.to_string(),
        })
    }
}

impl Drop for ChromeMutationSource {
    fn drop(&mut self) {
        debug!("Closing browser for {}", self.page_url);
        self.handler.abort();
    }
}

/// Decode a binding payload into the subtrees it carries.
pub fn decode_payload(payload: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(payload)?)
}

#[async_trait]
impl MutationSource for ChromeMutationSource {
    async fn next_batch(&mut self) -> Option<MutationBatch> {
        while let Some(event) = self.events.next().await {
            if event.name != BINDING {
                continue;
            }
            match decode_payload(&event.payload) {
                Ok(fragments) => {
                    return Some(MutationBatch {
                        fragments,
                        page_url: Some(self.page_url.clone()),
                    })
                }
                Err(e) => warn!("Dropping malformed mutation payload: {}", e),
            }
        }
        None
    }
}
