//! Reminder message rendering.

use campana_core::config::MessageConfig;

use crate::catalog::Event;
use crate::clock::CivilTime;

/// Greeting band for the hour the reminder goes out (not the session hour).
pub fn greeting_for_hour(hour: u32) -> &'static str {
    if hour < 12 {
        "BUENOS DÍAS"
    } else if hour < 18 {
        "BUENAS TARDES"
    } else {
        "BUENAS NOCHES"
    }
}

/// Render the reminder text for one session.
pub fn render(event: &Event, now: &CivilTime, cfg: &MessageConfig) -> String {
    let greeting = greeting_for_hour(now.hour);
    format!(
        "🌟 *{greeting}, {audience}* 🌟\n\
         \n\
         👮‍♂️ En breve estaremos en clase de:\n\
         \n\
         📘 *{subject}*\n\
         👨‍🏫 *Profesor:* {teacher}\n\
         \n\
         💡 Cada minuto de estudio hoy es un paso más hacia tu objetivo.\n\
         ¡Conéctate y sigue avanzando! 💪📚\n\
         🔗 Enlace de la clase:\n \
         {link}",
        audience = cfg.audience,
        subject = event.subject,
        teacher = event.teacher,
        link = cfg.class_link,
    )
}
