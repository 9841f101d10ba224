/// Player position code -> stored position. Unknown codes fall back to `ST`.
pub fn normalize_position(code: &str) -> &'static str {
    match code {
        "GK" => "GK",
        "CB" => "CB",
        "RB" => "RB",
        "LB" => "LB",
        "CDM" => "DM",
        "CM" => "CM",
        "CAM" => "AM",
        "AM" => "AM",
        "LW" => "LW",
        "RW" => "RW",
        "CF" => "ST",
        "ST" => "ST",
        _ => "ST",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerType {
    Standard,
    Prime,
    Icon,
    Legend,
    PrimeLegend,
}

impl PlayerType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "standard" => PlayerType::Standard,
            "prime" => PlayerType::Prime,
            "icon" => PlayerType::Icon,
            "legend" => PlayerType::Legend,
            "prime legend" => PlayerType::PrimeLegend,
            _ => PlayerType::Standard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerType::Standard => "standard",
            PlayerType::Prime => "prime",
            PlayerType::Icon => "icon",
            PlayerType::Legend => "legend",
            PlayerType::PrimeLegend => "prime legend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_table_is_fixed() {
        let expected = [
            ("GK", "GK"),
            ("CB", "CB"),
            ("RB", "RB"),
            ("LB", "LB"),
            ("CDM", "DM"),
            ("CM", "CM"),
            ("CAM", "AM"),
            ("AM", "AM"),
            ("LW", "LW"),
            ("RW", "RW"),
            ("CF", "ST"),
            ("ST", "ST"),
        ];
        for (code, stored) in expected {
            assert_eq!(normalize_position(code), stored, "{code}");
        }
    }

    #[test]
    fn unknown_positions_become_striker() {
        for code in ["DM", "gk", "", "LWB", " CB"] {
            assert_eq!(normalize_position(code), "ST", "{code:?}");
        }
    }

    #[test]
    fn player_types_coerce_to_standard() {
        assert_eq!(PlayerType::parse("prime legend"), PlayerType::PrimeLegend);
        assert_eq!(PlayerType::parse("icon").as_str(), "icon");
        assert_eq!(PlayerType::parse("Legend"), PlayerType::Standard);
        assert_eq!(PlayerType::parse("mythic").as_str(), "standard");
    }
}
