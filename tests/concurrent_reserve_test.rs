// ==========================================
// 产能台账并发控制测试
// ==========================================
// 职责: 验证同日名额竞争下绝不超订
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod concurrent_reserve_test {
    use chrono::NaiveDate;
    use std::thread;
    use tortas_agenda::repository::{CapacityLedgerRepository, RepositoryError};

    use crate::test_helpers::create_test_db;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 10 个线程抢同一天的 2 个名额, 恰好 2 个成功
    #[test]
    fn test_concurrent_reserve_never_overbooks() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let target = date(2026, 9, 10);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let db_path = db_path.clone();
                thread::spawn(move || {
                    // 每个线程独立连接, 竞争发生在数据库行上
                    let ledger = CapacityLedgerRepository::new(&db_path, 2).unwrap();
                    ledger.reserve(target)
                })
            })
            .collect();

        let mut ok = 0;
        let mut full = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => ok += 1,
                Err(RepositoryError::CapacityExceeded { date, capacity }) => {
                    assert_eq!(date, target);
                    assert_eq!(capacity, 2);
                    full += 1;
                }
                Err(e) => panic!("意外错误: {}", e),
            }
        }

        assert_eq!(ok, 2, "恰好 capacity 个请求成功");
        assert_eq!(full, 8);

        let ledger = CapacityLedgerRepository::new(&db_path, 2).unwrap();
        let slot = ledger.day_availability(target).unwrap();
        assert_eq!(slot.reserved, 2);
        assert_eq!(slot.capacity, 2);
        assert_eq!(slot.remaining(), 0);

        println!("✅ 并发预约测试通过: 10 请求 / 2 名额 / 零超订");
    }

    /// 不同日期的名额互不影响
    #[test]
    fn test_reserve_different_dates_independent() {
        let (_temp_file, db_path) = create_test_db().unwrap();

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let db_path = db_path.clone();
                thread::spawn(move || {
                    let ledger = CapacityLedgerRepository::new(&db_path, 2).unwrap();
                    ledger.reserve(date(2026, 9, 1 + (i % 3)))
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        let ledger = CapacityLedgerRepository::new(&db_path, 2).unwrap();
        for day in 1..=3 {
            let slot = ledger.day_availability(date(2026, 9, day)).unwrap();
            assert_eq!(slot.reserved, 2, "9月{}日应恰好满员", day);
        }

        println!("✅ 多日期独立预约测试通过");
    }

    /// 同一预约凭据重试只占一个名额（幂等）
    #[test]
    fn test_reserve_with_id_is_idempotent() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let ledger = CapacityLedgerRepository::new(&db_path, 2).unwrap();
        let target = date(2026, 9, 20);

        ledger.reserve_with_id(target, "retry-token-1").unwrap();
        ledger.reserve_with_id(target, "retry-token-1").unwrap();
        ledger.reserve_with_id(target, "retry-token-1").unwrap();

        let slot = ledger.day_availability(target).unwrap();
        assert_eq!(slot.reserved, 1);

        println!("✅ 幂等预约测试通过: 3 次重试只占 1 个名额");
    }

    /// 释放后名额可再次预约, 且 reserved 不会降到负数
    #[test]
    fn test_release_frees_slot() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let ledger = CapacityLedgerRepository::new(&db_path, 1).unwrap();
        let target = date(2026, 10, 5);

        let reservation_id = ledger.reserve(target).unwrap();
        assert!(ledger.reserve(target).unwrap_err().is_capacity_exceeded());

        ledger.release_reservation(&reservation_id).unwrap();
        // 凭据重复释放是 no-op
        ledger.release_reservation(&reservation_id).unwrap();

        let slot = ledger.day_availability(target).unwrap();
        assert_eq!(slot.reserved, 0);
        assert!(ledger.reserve(target).is_ok());

        // 无记录日期 release 也是 no-op
        ledger.release(date(2030, 1, 1)).unwrap();

        println!("✅ 名额释放测试通过");
    }

    /// 两单已满的第三单被拒, 其余日期不受影响
    #[test]
    fn test_third_order_on_full_day_rejected() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let ledger = CapacityLedgerRepository::new(&db_path, 2).unwrap();
        let full_day = date(2026, 9, 3);

        ledger.reserve(full_day).unwrap();
        ledger.reserve(full_day).unwrap();

        let err = ledger.reserve(full_day).unwrap_err();
        assert!(err.is_capacity_exceeded());

        assert!(ledger.reserve(date(2026, 9, 4)).is_ok());

        let snapshot = ledger
            .get_availability(date(2026, 9, 3), date(2026, 9, 5))
            .unwrap();
        assert_eq!(snapshot[&full_day].remaining(), 0);
        assert_eq!(snapshot[&date(2026, 9, 4)].remaining(), 1);
        // 无记录日期补默认值
        assert_eq!(snapshot[&date(2026, 9, 5)].remaining(), 2);

        println!("✅ 满员拒单测试通过");
    }
}
