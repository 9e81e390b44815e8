//! Coordinate-based element interactions
//!
//! Elements are addressed only by the point recorded at extraction time;
//! nothing here re-resolves an element by selector.

use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::TypeOptions;
use crate::address::ElementAddress;
use crate::cdp::{CdpClient, KeyPress};
use crate::Result;

/// Opens links in the current tab so clicks never spawn targets we don't track
pub const STRIP_LINK_TARGETS_SCRIPT: &str = r#"(function() {
  const links = document.getElementsByTagName('a');
  for (let i = 0; i < links.length; i++) links[i].removeAttribute('target');
})()"#;

/// Click the element's center
pub async fn click_element(client: &dyn CdpClient, address: &ElementAddress) -> Result<()> {
    // Best effort; a failure only means a link may open a new tab
    if let Err(e) = client.evaluate(STRIP_LINK_TARGETS_SCRIPT, false).await {
        warn!("Could not strip link targets before click (ignored): {}", e);
    }

    client.click_at(address.center.x, address.center.y).await?;
    debug!("Clicked at ({}, {})", address.center.x, address.center.y);
    Ok(())
}

/// Focus by clicking, optionally clear, type, optionally submit.
///
/// With `delay` set every character is a separate key event followed by a
/// random pause between the two bounds, in milliseconds, in either order.
pub async fn type_into(
    client: &dyn CdpClient,
    address: &ElementAddress,
    text: &str,
    options: TypeOptions,
    delay: Option<(u64, u64)>,
) -> Result<()> {
    client.click_at(address.center.x, address.center.y).await?;

    if options.clear {
        client.dispatch_key(&KeyPress::select_all()).await?;
        client.dispatch_key(&KeyPress::backspace()).await?;
    }

    match delay {
        None => client.insert_text(text).await?,
        Some((a, b)) => {
            let (min, max) = (a.min(b), a.max(b));
            for ch in text.chars() {
                client.type_char(ch).await?;
                let pause = rand::thread_rng().gen_range(min..=max);
                tokio::time::sleep(Duration::from_millis(pause)).await;
            }
        }
    }

    if options.submit {
        client.dispatch_key(&KeyPress::enter()).await?;
    }

    debug!(
        "Typed {} char(s) at ({}, {}), clear={}, submit={}",
        text.chars().count(),
        address.center.x,
        address.center.y,
        options.clear,
        options.submit
    );
    Ok(())
}
