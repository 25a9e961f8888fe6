//! Message texts for the Telegram surface. All user-supplied strings go
//! through HTML escaping; messages are sent with parse_mode=HTML.

use crate::catalog::types::PromotionCandidate;

/// Callback payload of the inline "check now" button.
pub const CHECK_CALLBACK: &str = "check_games";

fn esc(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

fn promo_block(p: &PromotionCandidate, link_label: &str) -> String {
    format!(
        "🎯 <b>{}</b>\n💰 Temporarily free (normally ${:.2})\n🔗 <a href=\"{}\">{}</a>\n",
        esc(&p.name),
        p.initial_price,
        p.url,
        link_label
    )
}

/// Notification body for a batch of newly-detected promotions.
pub fn promotions_text(promos: &[PromotionCandidate]) -> String {
    if promos.len() == 1 {
        format!(
            "🎮 <b>New -100% promotion on Steam!</b>\n\n{}\n⚡ <b>Limited-time promotion!</b>",
            promo_block(&promos[0], "Grab the game now")
        )
    } else {
        let mut out = format!(
            "🎮 <b>{} new -100% promotions on Steam!</b>\n\n",
            promos.len()
        );
        for p in promos {
            out.push_str(&promo_block(p, "Grab it now"));
            out.push('\n');
        }
        out.push_str("⚡ <b>Limited-time promotions!</b>");
        out
    }
}

/// Reply to a manual check that found nothing to announce.
pub fn no_promotions_text() -> String {
    "🎮 No genuine -100% promotion found on Steam right now.\n\n\
     ℹ️ Only paid games that temporarily become free are announced here,\n\
     not titles that are free-to-play by design (CS2, TF2, Dota 2, ...)."
        .to_string()
}

/// First reply of a manual check, sent before the feed is fetched.
pub fn checking_text() -> &'static str {
    "🔍 Checking for -100% promotions..."
}

/// /start reply for a newly-registered chat.
pub fn welcome_text() -> String {
    "🎮 <b>Welcome to Steam Promo Notifier!</b>\n\n\
     You will be notified about games in a <b>genuine -100% promotion</b>: \
     paid titles that temporarily become free, never the free-to-play staples.\n\n\
     ⚡ <b>What gets watched:</b>\n\
     • paid games dropping to a 100% discount\n\
     • announced once per game, no repeats\n\n\
     🔍 <b>Manual check:</b> use the button below or /check\n\n\
     ✅ You are now registered for notifications!"
        .to_string()
}

/// /start reply for a chat that is already registered.
pub fn welcome_back_text() -> String {
    "✅ You are already registered for notifications.\n\n\
     🔍 Use the button below or /check to look for promotions right now."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, name: &str, price: f64) -> PromotionCandidate {
        PromotionCandidate {
            app_id: id.to_string(),
            name: name.to_string(),
            initial_price: price,
            url: format!("https://store.steampowered.com/app/{id}/"),
        }
    }

    #[test]
    fn single_promotion_layout() {
        let text = promotions_text(&[candidate("100", "Portal 2", 5.0)]);
        assert!(text.contains("New -100% promotion"));
        assert!(text.contains("Portal 2"));
        assert!(text.contains("$5.00"));
        assert!(text.contains("/app/100/"));
    }

    #[test]
    fn multi_promotion_layout_counts_and_lists_all() {
        let text = promotions_text(&[
            candidate("100", "A", 5.0),
            candidate("200", "B", 19.99),
        ]);
        assert!(text.contains("2 new -100% promotions"));
        assert!(text.contains("$19.99"));
        assert!(text.contains("/app/100/") && text.contains("/app/200/"));
    }

    #[test]
    fn display_names_are_html_escaped() {
        let text = promotions_text(&[candidate("1", "Ori & <i>the Blind Forest</i>", 9.99)]);
        assert!(text.contains("Ori &amp; &lt;i&gt;the Blind Forest&lt;/i&gt;"));
        assert!(!text.contains("<i>the"));
    }

    #[test]
    fn no_promotions_text_mentions_free_to_play_exclusion() {
        assert!(no_promotions_text().contains("free-to-play"));
    }
}
