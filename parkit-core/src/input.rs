use crate::{ParkingError, ParkingResult};

/// Longest plate the ticket table accepts.
pub const MAX_PLATE_LEN: usize = 10;

/// Where the operator's answers come from (terminal prompt, request body, ...).
pub trait InputSource: Send + Sync {
    /// Raw menu selection for the vehicle type.
    fn read_category_selection(&self) -> ParkingResult<i32>;

    /// Vehicle registration number, already normalized.
    fn read_plate(&self) -> ParkingResult<String>;
}

/// Trim and upper-case a plate, rejecting empty or over-long values.
pub fn normalize_plate(raw: &str) -> ParkingResult<String> {
    let plate = raw.trim().to_ascii_uppercase();

    if plate.is_empty() {
        return Err(ParkingError::InvalidPlate("plate is empty".to_string()));
    }
    if plate.chars().count() > MAX_PLATE_LEN {
        return Err(ParkingError::InvalidPlate(format!(
            "{} is longer than {} characters",
            plate, MAX_PLATE_LEN
        )));
    }

    Ok(plate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate("  abcdef ").unwrap(), "ABCDEF");
        assert!(matches!(normalize_plate("   "), Err(ParkingError::InvalidPlate(_))));
        assert!(matches!(
            normalize_plate("ABCDEFGHIJK"),
            Err(ParkingError::InvalidPlate(_))
        ));
    }
}
