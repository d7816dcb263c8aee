//! Utilidades de tiempo
//!
//! Este módulo contiene helpers para convertir entre horas "HH:MM",
//! ventanas de entrega y minutos desde medianoche (la unidad interna
//! del motor de planificación).

use chrono::NaiveTime;
use validator::ValidationError;

/// Minutos en un día. Las ETAs que cruzan medianoche se formatean módulo 24h.
const MINUTOS_POR_DIA: u32 = 24 * 60;

/// Parsear una hora "HH:MM" a minutos desde medianoche
pub fn parse_hora(value: &str) -> Result<u32, ValidationError> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        let mut error = ValidationError::new("hora");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"HH:MM".to_string());
        error
    })?;

    Ok(time.format("%H").to_string().parse::<u32>().unwrap_or(0) * 60
        + time.format("%M").to_string().parse::<u32>().unwrap_or(0))
}

/// Formatear minutos desde medianoche como "HH:MM"
pub fn format_minutos(minutos: u32) -> String {
    let normalizado = minutos % MINUTOS_POR_DIA;
    format!("{:02}:{:02}", normalizado / 60, normalizado % 60)
}

/// Parsear una ventana de entrega "08:00-12:00" (acepta "-", "–" o " a ")
///
/// Retorna `(inicio, fin)` en minutos desde medianoche.
pub fn parse_ventana(value: &str) -> Result<(u32, u32), ValidationError> {
    let normalizada = value.replace('–', "-").replace(" a ", "-");
    let partes: Vec<&str> = normalizada.split('-').map(|p| p.trim()).collect();

    if partes.len() != 2 {
        let mut error = ValidationError::new("ventana");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"HH:MM-HH:MM".to_string());
        return Err(error);
    }

    let inicio = parse_hora(partes[0])?;
    let fin = parse_hora(partes[1])?;

    if fin <= inicio {
        let mut error = ValidationError::new("ventana_invertida");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }

    Ok((inicio, fin))
}

/// Validar coordenadas GPS
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat);
        return Err(error);
    }

    if !(-180.0..=180.0).contains(&lon) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lon);
        return Err(error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hora_valida() {
        assert_eq!(parse_hora("08:00").unwrap(), 480);
        assert_eq!(parse_hora("00:00").unwrap(), 0);
        assert_eq!(parse_hora("23:59").unwrap(), 1439);
    }

    #[test]
    fn parse_hora_invalida() {
        assert!(parse_hora("25:00").is_err());
        assert!(parse_hora("8am").is_err());
        assert!(parse_hora("").is_err());
    }

    #[test]
    fn format_minutos_normaliza_medianoche() {
        assert_eq!(format_minutos(480), "08:00");
        assert_eq!(format_minutos(1445), "00:05");
    }

    #[test]
    fn parse_ventana_con_guion_y_en_dash() {
        assert_eq!(parse_ventana("08:00-12:00").unwrap(), (480, 720));
        assert_eq!(parse_ventana("08:00–12:00").unwrap(), (480, 720));
    }

    #[test]
    fn parse_ventana_invertida_falla() {
        assert!(parse_ventana("12:00-08:00").is_err());
    }

    #[test]
    fn coordenadas_fuera_de_rango() {
        assert!(validate_coordinates(-91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, 181.0).is_err());
        assert!(validate_coordinates(-33.45, -70.66).is_ok());
    }
}
