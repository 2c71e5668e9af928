//! Sign-in, token refresh, and order creation against the vendor UI.

use std::time::Duration;

use tracing::{info, warn};

use crate::{FlowError, OrderReceipt, OrderRequest, VendorWorkflow};

impl VendorWorkflow<'_> {
    fn element_budget(&self) -> Duration {
        Duration::from_secs(self.vendor.waits.element_secs)
    }

    /// Log into the vendor site and wait for the post-login redirect.
    pub async fn sign_in(&self) -> Result<(), FlowError> {
        let selectors = &self.vendor.selectors;
        let creds = &self.vendor.credentials;

        info!(target: "flow.signin", email = %creds.email, "signing in to vendor");
        self.browser
            .navigate(&self.vendor.url(&self.vendor.sign_in_path))
            .await?;
        self.browser
            .wait_for(&selectors.email_input, self.element_budget())
            .await?;

        self.browser.fill(&selectors.email_input, &creds.email).await?;
        self.browser
            .fill(&selectors.password_input, &creds.password)
            .await?;
        self.browser.press_enter(&selectors.password_input).await?;

        let redirected = self
            .browser
            .wait_until_url_leaves(
                &self.vendor.sign_in_fragment,
                Duration::from_secs(self.vendor.waits.login_secs),
            )
            .await?;
        if !redirected {
            warn!(target: "flow.signin", email = %creds.email, "still on sign-in page after submit");
            return Err(FlowError::Auth {
                email: creds.email.clone(),
            });
        }

        info!(target: "flow.signin", "sign-in accepted");
        Ok(())
    }

    /// Refresh the upstream network's auth token on the vendor account.
    pub async fn update_auth_token(&self, token: &str) -> Result<(), FlowError> {
        let path = self
            .vendor
            .auth_token_path
            .as_deref()
            .ok_or(FlowError::Config("vendor.auth_token_path is not set"))?;
        let input = self
            .vendor
            .selectors
            .token_input
            .as_ref()
            .ok_or(FlowError::Config("vendor.selectors.token_input is not set"))?;
        let submit = self
            .vendor
            .selectors
            .token_submit
            .as_ref()
            .ok_or(FlowError::Config("vendor.selectors.token_submit is not set"))?;

        info!(target: "flow.order", "updating upstream auth token");
        self.browser.navigate(&self.vendor.url(path)).await?;
        self.browser.wait_for(input, self.element_budget()).await?;
        self.browser.fill(input, token).await?;
        self.browser.click(submit).await?;
        Ok(())
    }

    /// Submit a lead-search order and return its identifiers.
    ///
    /// The order id is read from the `id` attribute of the newest entry
    /// on the orders listing; the vendor encodes it as the suffix after
    /// the final underscore.
    pub async fn create_order(&self, request: &OrderRequest) -> Result<OrderReceipt, FlowError> {
        let selectors = &self.vendor.selectors;

        info!(
            target: "flow.order",
            lead_source = %request.lead_source_url,
            leads_limit = ?request.leads_limit,
            "creating lead-search order"
        );
        self.browser
            .navigate(&self.vendor.url(&self.vendor.order_new_path))
            .await?;
        self.browser
            .wait_for(&selectors.lead_url_input, self.element_budget())
            .await?;
        self.browser
            .fill(&selectors.lead_url_input, &request.lead_source_url)
            .await?;
        self.browser.click(&selectors.check_button).await?;

        // The create button only renders once the vendor has validated
        // the lead source; waiting for it replaces the original's ten
        // second sleep.
        self.browser
            .wait_for(&selectors.create_order_button, self.element_budget())
            .await?;

        if let Some(limit) = request.leads_limit {
            let input = selectors
                .leads_limit_input
                .as_ref()
                .ok_or(FlowError::Config(
                    "vendor.selectors.leads_limit_input is not set",
                ))?;
            self.browser.fill(input, &limit.to_string()).await?;
        }

        self.browser.click(&selectors.create_order_button).await?;

        self.browser
            .navigate(&self.vendor.url(&self.vendor.orders_path))
            .await?;
        self.browser
            .wait_for(&selectors.order_item, self.element_budget())
            .await?;

        let dom_id = self
            .browser
            .attr(&selectors.order_item, "id")
            .await?
            .ok_or(FlowError::MissingOrderId)?;
        let order_id = dom_id
            .rsplit('_')
            .next()
            .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()))
            .ok_or(FlowError::MissingOrderId)?
            .to_string();

        let export_url = self.vendor.export_url(&order_id);
        info!(target: "flow.order", %order_id, "order created");
        Ok(OrderReceipt {
            order_id,
            export_url,
        })
    }
}
