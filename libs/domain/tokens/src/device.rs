// [libs/domain/tokens/src/device.rs]
/*!
 * APARATO: DEVICE FINGERPRINT HEURISTIC (ESTRATO L2)
 * RESPONSABILIDAD: ETIQUETA LEGIBLE DE DISPOSITIVO A PARTIR DEL USER-AGENT
 */

/// Heuristica de deteccion de dispositivo por substring, preservada del
/// sistema de origen. No pretende ser un parser de user-agent completo,
/// solo una etiqueta legible para el directorio de sesiones del usuario.
pub fn extract_device_label(user_agent: &str) -> String {
    if user_agent.is_empty() {
        return "Unknown Device".to_string();
    }
    if user_agent.contains("Mobile") {
        if user_agent.contains("iPhone") {
            "iPhone".to_string()
        } else if user_agent.contains("Android") {
            "Android".to_string()
        } else {
            "Mobile".to_string()
        }
    } else if user_agent.contains("iPad") {
        "iPad".to_string()
    } else if user_agent.contains("Macintosh") {
        "Mac".to_string()
    } else if user_agent.contains("Windows") {
        "Windows".to_string()
    } else if user_agent.contains("Linux") {
        "Linux".to_string()
    } else {
        "Desktop".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_iphone_before_generic_mobile() {
        assert_eq!(extract_device_label("Mozilla/5.0 (iPhone; Mobile)"), "iPhone");
    }

    #[test]
    fn falls_back_to_unknown_for_empty_agent() {
        assert_eq!(extract_device_label(""), "Unknown Device");
    }

    #[test]
    fn detects_desktop_platforms() {
        assert_eq!(extract_device_label("Windows NT 10.0"), "Windows");
        assert_eq!(extract_device_label("X11; Linux x86_64"), "Linux");
        assert_eq!(extract_device_label("Macintosh; Intel Mac OS X"), "Mac");
    }
}
