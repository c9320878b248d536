//! tests for row-key composition and group-key derivation

#[cfg(test)]
mod tests {
    use crate::rowkey::{
        compose_row_key, group_key, normalize_chain, pad_sequence, scan_prefix,
    };

    #[test]
    fn test_compose_is_deterministic() {
        let a = compose_row_key("2", "0xABC", "42");
        let b = compose_row_key("2", "0xABC", "42");
        assert_eq!(a, b);
        assert_eq!(a, "2:0xABC:0000000000000042");
    }

    #[test]
    fn test_chain_name_normalization_is_case_insensitive() {
        assert_eq!(normalize_chain("ethereum"), "2");
        assert_eq!(normalize_chain("Ethereum"), "2");
        assert_eq!(normalize_chain("ETHEREUM"), "2");
        assert_eq!(normalize_chain("solana"), "1");
        assert_eq!(normalize_chain("terra"), "3");
        assert_eq!(normalize_chain("bsc"), "4");
    }

    #[test]
    fn test_chain_name_normalization_is_idempotent() {
        // a numeric id and its name compose to the same key
        let by_name = compose_row_key("Ethereum", "0xABC", "7");
        let by_id = compose_row_key("2", "0xABC", "7");
        assert_eq!(by_name, by_id);
        assert_eq!(normalize_chain(&normalize_chain("ethereum")), "2");
    }

    #[test]
    fn test_unrecognized_chain_passes_through() {
        assert_eq!(normalize_chain("polygon"), "polygon");
        assert_eq!(normalize_chain("17"), "17");
    }

    #[test]
    fn test_sequence_padding() {
        assert_eq!(pad_sequence("7"), "0000000000000007");
        assert_eq!(pad_sequence("7").len(), 16);

        // exactly 16 characters is unchanged
        let sixteen = "1234567812345678";
        assert_eq!(pad_sequence(sixteen), sixteen);

        // 17 characters is unchanged, never truncated
        let seventeen = "12345678123456789";
        assert_eq!(pad_sequence(seventeen), seventeen);
    }

    #[test]
    fn test_group_key_derivation() {
        let key = "2:0xABC:0000000000000042";
        assert_eq!(group_key(0, key), "*");
        assert_eq!(group_key(1, key), "2");
        assert_eq!(group_key(2, key), "2:0xABC");
    }

    #[test]
    fn test_scan_prefix() {
        assert_eq!(scan_prefix("", ""), "");
        assert_eq!(scan_prefix("", "0xABC"), "");
        assert_eq!(scan_prefix("2", ""), "2");
        assert_eq!(scan_prefix("ethereum", ""), "2");
        assert_eq!(scan_prefix("2", "0xABC"), "2:0xABC");
    }
}
