// ==========================================
// 产能查询 API 测试
// ==========================================
// 职责: 验证区间查询校验与月视图投影
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod availability_api_test {
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;
    use tortas_agenda::api::{ApiError, AvailabilityApi, OrderApi};
    use tortas_agenda::engine::GRID_CELLS;
    use tortas_agenda::repository::{CapacityLedgerRepository, OrderIntentRepository};

    use crate::test_helpers::create_test_db;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(db_path: &str) -> (AvailabilityApi, Arc<CapacityLedgerRepository>) {
        let ledger = Arc::new(CapacityLedgerRepository::new(db_path, 2).unwrap());
        (AvailabilityApi::new(ledger.clone(), 2), ledger)
    }

    #[test]
    fn test_range_query_fills_missing_days() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let (api, ledger) = setup(&db_path);

        ledger.reserve(date(2026, 9, 2)).unwrap();

        let days = api
            .get_availability(date(2026, 9, 1), date(2026, 9, 3))
            .unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].remaining, 2);
        assert_eq!(days[1].reserved, 1);
        assert_eq!(days[1].remaining, 1);
        assert_eq!(days[2].remaining, 2);

        println!("✅ 区间查询补全测试通过");
    }

    #[test]
    fn test_range_validation() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let (api, _) = setup(&db_path);

        // from > to
        let err = api
            .get_availability(date(2026, 9, 10), date(2026, 9, 1))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        // 区间超过 365 天
        let from = date(2026, 1, 1);
        let err = api
            .get_availability(from, from + Duration::days(366))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        // 恰好 365 天合法
        assert!(api.get_availability(from, from + Duration::days(365)).is_ok());

        println!("✅ 区间校验测试通过");
    }

    #[test]
    fn test_month_view_projection() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let (api, ledger) = setup(&db_path);
        let today = date(2026, 9, 1);

        // 9 月 10 日占满
        ledger.reserve(date(2026, 9, 10)).unwrap();
        ledger.reserve(date(2026, 9, 10)).unwrap();

        let grid = api.month_view(today, today).unwrap();
        assert_eq!(grid.len(), GRID_CELLS);

        let by_date = |d: NaiveDate| grid.iter().find(|s| s.date == d).unwrap();
        assert!(!by_date(date(2026, 9, 10)).is_selectable);
        assert_eq!(by_date(date(2026, 9, 10)).remaining(), 0);
        // 前置期内不可选
        assert!(!by_date(date(2026, 9, 2)).is_selectable);
        assert!(by_date(date(2026, 9, 3)).is_selectable);

        println!("✅ 月视图投影测试通过");
    }

    #[test]
    fn test_order_api_lookup() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let orders = Arc::new(OrderIntentRepository::new(&db_path).unwrap());
        let api = OrderApi::new(orders);

        assert!(matches!(
            api.get_order("TK-NOEXISTE").unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            api.get_order("   ").unwrap_err(),
            ApiError::InvalidInput(_)
        ));
        assert!(api.list_recent(10).unwrap().is_empty());

        println!("✅ 订单查询 API 测试通过");
    }
}
