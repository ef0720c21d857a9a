//! Unit tests for the identifier types

use core_kernel::{CaseId, RequestId};
use uuid::Uuid;

mod case_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = CaseId::new();
        let id2 = CaseId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_sorts_in_creation_order() {
        let id1 = CaseId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = CaseId::new_v7();
        assert!(id1 < id2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = CaseId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_display_has_prefix() {
        let id = CaseId::new_v7();
        assert!(id.to_string().starts_with("CASE-"));
        assert_eq!(CaseId::prefix(), "CASE");
    }

    #[test]
    fn test_parse_round_trip() {
        let id = CaseId::new_v7();
        let parsed: CaseId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("CASE-not-a-uuid".parse::<CaseId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let uuid = Uuid::new_v4();
        let id = CaseId::from(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}

mod request_id_tests {
    use super::*;

    #[test]
    fn test_display_has_prefix() {
        assert!(RequestId::new().to_string().starts_with("REQ-"));
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let id = RequestId::from(uuid);
        let back: Uuid = id.into();
        assert_eq!(uuid, back);
    }
}
