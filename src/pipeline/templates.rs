//! Reply templates — a pure function of (mode, local hour, text).
//!
//! Keyword matches win over the mode template; the mode template replaces
//! only the generic fallback. This asymmetric precedence is deliberate and
//! preserved exactly (see DESIGN.md).

use crate::config::BotMode;
use crate::transport::{PromptOption, ReplyPrompt};

/// Greeting keywords acknowledged with the greeting template.
const GREETING_KEYWORDS: &[&str] = &["halo", "hi", "hello", "selamat"];

/// Thanks keywords answered with the you're-welcome template.
const THANKS_KEYWORDS: &[&str] = &["terima kasih", "thanks"];

/// Time-of-day greeting for the owner's local clock.
pub fn time_greeting(hour: u32) -> &'static str {
    match hour {
        4..=9 => "Selamat pagi",
        10..=14 => "Selamat siang",
        15..=17 => "Selamat sore",
        _ => "Selamat malam",
    }
}

/// Select the reply body for an inbound text.
pub fn compose(mode: BotMode, hour: u32, text: &str, owner: &str) -> String {
    let greet = time_greeting(hour);
    let lower = text.to_lowercase();

    if GREETING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return format!(
            "{greet} 👋! Terima kasih sudah menyapa. Pesan Anda sudah diterima oleh {owner}."
        );
    }
    if THANKS_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return "Sama-sama 😊 Senang bisa membantu.".to_string();
    }

    match mode {
        BotMode::Online | BotMode::Busy => format!(
            "Hai, {greet} 👋\n\
             Saya adalah asisten virtual milik {owner}.\n\
             Saat ini {owner} sedang sibuk, mohon ditunggu beberapa saat hingga beliau dapat membalas pesan Anda.\n\
             Terima kasih atas perhatian dan pengertiannya 🙏"
        ),
        BotMode::Offline => format!(
            "{greet} 👋\n\
             Mohon maaf, *{owner}* saat ini sedang tidak aktif.\n\
             Silakan tinggalkan pesan, dan *{owner}* akan membalasnya setelah kembali online.\n\
             Terima kasih atas pengertian dan kesabarannya 🙏"
        ),
    }
}

/// The binary assist offer attached when the owner is online but idle.
pub fn assist_prompt() -> ReplyPrompt {
    ReplyPrompt {
        footer: "Apakah Terbantu?".to_string(),
        options: vec![
            PromptOption {
                id: "assist_yes".to_string(),
                label: "Iya".to_string(),
            },
            PromptOption {
                id: "assist_no".to_string(),
                label: "Tidak".to_string(),
            },
        ],
    }
}

/// Acknowledgment after a sender accepts the assist offer.
pub fn assist_opt_in_ack() -> &'static str {
    "Terima kasih — saya akan terus membalas saat admin belum melihat chat."
}

/// Acknowledgment after a sender declines, naming the quiet period.
pub fn assist_opt_out_ack(cooldown_minutes: u64) -> String {
    format!("Baik. Saya tidak akan membalas selama {cooldown_minutes} menit.")
}
