//! Macro-generated test suite for `Store` contract validation.
//!
//! The `store_contract_tests!` macro generates a test module that validates
//! any `Store` implementation against the orderings, aggregates and the
//! cascading delete every backend must agree on.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use emporium::storage::InMemoryStore;
//!
//! store_contract_tests!(shared(InMemoryStore::new()));
//! ```

/// Generate a `Store` conformance test suite.
///
/// `$factory` must evaluate to an empty `Arc<dyn Store>`. It is re-evaluated
/// for each test to ensure isolation.
#[macro_export]
macro_rules! store_contract_tests {
    ($factory:expr) => {
        mod store_contract_tests {
            use super::*;
            use emporium::core::entity::{
                InvoiceStatus, ItemChanges, NewInvoice, NewInvoiceItem, NewItem,
            };
            use emporium::core::error::StoreError;
            use emporium::core::query::{DateRange, ItemFilter, Pagination};
            use emporium::core::store::{CatalogStore, InvoiceStore, RevenueStore};
            use chrono::NaiveDate;

            // ==================================================================
            // Catalogue
            // ==================================================================

            #[tokio::test]
            async fn test_get_missing_records() {
                let store = $factory;
                assert!(store.get_item(424242).await.unwrap().is_none());
                assert!(store.get_merchant(424242).await.unwrap().is_none());
                assert!(store.get_invoice(424242).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_list_pages_follow_id_order() {
                let store = $factory;
                let (_, items) = seed_items(store.as_ref(), 5).await;

                let first = store.list_items(Pagination::new(1, 2)).await.unwrap();
                let second = store.list_items(Pagination::new(2, 2)).await.unwrap();
                let third = store.list_items(Pagination::new(3, 2)).await.unwrap();
                let beyond = store.list_items(Pagination::new(4, 2)).await.unwrap();

                assert_eq!(first, items[0..2].to_vec());
                assert_eq!(second, items[2..4].to_vec());
                assert_eq!(third, items[4..5].to_vec());
                assert!(beyond.is_empty());
                assert!(store.list_items(Pagination::new(1, 0)).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_create_item_with_unknown_merchant() {
                let store = $factory;
                let err = store
                    .create_item(NewItem::new("Orphan", "No owner", 1.0, 987654))
                    .await
                    .unwrap_err();
                assert!(matches!(err, StoreError::MissingReference { entity: "Merchant", .. }));
            }

            #[tokio::test]
            async fn test_find_merchant_first_alphabetical_match() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;

                let found = store.find_merchant("AND").await.unwrap();
                assert_eq!(found, Some(c.klein.clone()));
                let found = store.find_merchant("jerde").await.unwrap();
                assert_eq!(found, Some(c.schroeder.clone()));
                assert!(store.find_merchant("zzz").await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_name_order_compares_punctuation_bytewise() {
                let store = $factory;
                let plain = store.create_merchant("Ab Supply").await.unwrap();
                let dashed = store.create_merchant("A-C Trading").await.unwrap();

                let found = store.find_merchant("a").await.unwrap();
                assert_eq!(found, Some(dashed.clone()));

                let ab = store
                    .create_item(NewItem::new("Ab", "Plain", 1.0, plain.id))
                    .await
                    .unwrap();
                let a_c = store
                    .create_item(NewItem::new("a-c", "Dashed", 1.0, dashed.id))
                    .await
                    .unwrap();
                let found = store
                    .find_items(&ItemFilter::Name("A".into()))
                    .await
                    .unwrap();
                assert_eq!(found, vec![a_c, ab]);
            }

            #[tokio::test]
            async fn test_find_items_by_name_and_price() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;

                let by_name = store
                    .find_items(&ItemFilter::Name("item".into()))
                    .await
                    .unwrap();
                assert_eq!(
                    by_name,
                    vec![c.autem.clone(), c.voluptatum.clone(), c.nemo.clone(), c.qui_esse.clone()]
                );

                let in_range = store
                    .find_items(&ItemFilter::Price { min: Some(300.0), max: Some(700.0) })
                    .await
                    .unwrap();
                assert_eq!(in_range, vec![c.autem.clone(), c.voluptatum.clone()]);

                let cheap = store
                    .find_items(&ItemFilter::Price { min: None, max: Some(43.27) })
                    .await
                    .unwrap();
                assert_eq!(cheap, vec![c.nemo.clone(), c.ring.clone()]);

                let none = store
                    .find_items(&ItemFilter::Name("sofa".into()))
                    .await
                    .unwrap();
                assert!(none.is_empty());
            }

            #[tokio::test]
            async fn test_merchants_with_most_items() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;

                let ranked = store.merchants_with_most_items(5).await.unwrap();
                let summary: Vec<(i64, i64)> =
                    ranked.iter().map(|r| (r.merchant.id, r.count)).collect();
                assert_eq!(summary, vec![(c.schroeder.id, 3), (c.klein.id, 2)]);

                let top = store.merchants_with_most_items(1).await.unwrap();
                assert_eq!(top.len(), 1);
                assert_eq!(top[0].merchant, c.schroeder);
            }

            #[tokio::test]
            async fn test_merchant_items() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;

                let items = store.merchant_items(c.klein.id).await.unwrap();
                assert_eq!(items, vec![c.nemo.clone(), c.ring.clone()]);
                assert!(store.merchant_items(c.willms.id).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_update_item() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;

                let changes = ItemChanges {
                    name: Some("Gold Ring".into()),
                    unit_price: Some(99.99),
                    merchant_id: Some(c.willms.id),
                    ..Default::default()
                };
                let updated = store.update_item(c.ring.id, changes).await.unwrap().unwrap();
                assert_eq!(updated.name, "Gold Ring");
                assert_eq!(updated.description, c.ring.description);
                assert_close(updated.unit_price, 99.99);
                assert_eq!(updated.merchant_id, c.willms.id);
                assert_eq!(store.get_item(c.ring.id).await.unwrap(), Some(updated));

                let missing = store
                    .update_item(987654, ItemChanges::default())
                    .await
                    .unwrap();
                assert!(missing.is_none());

                let bad_owner = ItemChanges {
                    merchant_id: Some(987654),
                    ..Default::default()
                };
                assert!(store.update_item(c.ring.id, bad_owner).await.is_err());
            }

            #[tokio::test]
            async fn test_prices_are_stored_in_cents() {
                let store = $factory;
                let merchant = store.create_merchant("Rounding Co").await.unwrap();

                let item = store
                    .create_item(NewItem::new("Pi", "Irrational", 3.14159, merchant.id))
                    .await
                    .unwrap();
                assert_close(item.unit_price, 3.14);
                let stored = store.get_item(item.id).await.unwrap().unwrap();
                assert_close(stored.unit_price, 3.14);

                let changes = ItemChanges {
                    unit_price: Some(7.456),
                    ..Default::default()
                };
                let updated = store.update_item(item.id, changes).await.unwrap().unwrap();
                assert_close(updated.unit_price, 7.46);
            }

            // ==================================================================
            // Cascading delete
            // ==================================================================

            #[tokio::test]
            async fn test_delete_item_removes_emptied_invoices_only() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;
                let inv = &c.invoices;

                assert!(store.delete_item(c.qui_esse.id).await.unwrap());

                assert!(store.get_item(c.qui_esse.id).await.unwrap().is_none());
                assert!(store.get_invoice(inv[0].id).await.unwrap().is_none());
                assert!(store.get_invoice(inv[3].id).await.unwrap().is_none());
                for kept in [&inv[1], &inv[2], &inv[4]] {
                    assert!(store.get_invoice(kept.id).await.unwrap().is_some());
                }
            }

            #[tokio::test]
            async fn test_delete_item_keeps_invoices_with_other_items() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;
                let inv = &c.invoices;

                assert!(store.delete_item(c.nemo.id).await.unwrap());

                let lines = store.invoice_items(inv[1].id).await.unwrap();
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].item_id, c.autem.id);

                let lines = store.invoice_items(inv[4].id).await.unwrap();
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].item_id, c.ring.id);

                for invoice in inv {
                    assert!(store.get_invoice(invoice.id).await.unwrap().is_some());
                }
            }

            #[tokio::test]
            async fn test_delete_item_removes_invoice_with_repeated_lines() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;

                let invoice = store
                    .create_invoice(NewInvoice {
                        status: InvoiceStatus::Shipped,
                        created_at: at(2012, 3, 21, 8),
                    })
                    .await
                    .unwrap();
                for quantity in [1, 2] {
                    store
                        .create_invoice_item(NewInvoiceItem {
                            invoice_id: invoice.id,
                            item_id: c.ring.id,
                            quantity,
                            unit_price: c.ring.unit_price,
                        })
                        .await
                        .unwrap();
                }

                assert!(store.delete_item(c.ring.id).await.unwrap());

                assert!(store.get_invoice(invoice.id).await.unwrap().is_none());
                assert!(store.invoice_items(invoice.id).await.unwrap().is_empty());
                let lines = store.invoice_items(c.invoices[4].id).await.unwrap();
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].item_id, c.nemo.id);
            }

            #[tokio::test]
            async fn test_delete_missing_item() {
                let store = $factory;
                seed_catalogue(store.as_ref()).await;
                assert!(!store.delete_item(987654).await.unwrap());
            }

            // ==================================================================
            // Revenue
            // ==================================================================

            #[tokio::test]
            async fn test_total_revenue_excludes_cancelled() {
                let store = $factory;
                seed_catalogue(store.as_ref()).await;

                let total = store.total_revenue(DateRange::default()).await.unwrap();
                assert_close(total.revenue, TOTAL_REVENUE);
            }

            #[tokio::test]
            async fn test_total_revenue_within_dates() {
                let store = $factory;
                seed_catalogue(store.as_ref()).await;

                let first_week = DateRange {
                    start: NaiveDate::from_ymd_opt(2012, 3, 5),
                    end: NaiveDate::from_ymd_opt(2012, 3, 7),
                };
                let total = store.total_revenue(first_week).await.unwrap();
                assert_close(total.revenue, 1502.14 + 800.57);

                let single_day = DateRange {
                    start: NaiveDate::from_ymd_opt(2012, 3, 14),
                    end: NaiveDate::from_ymd_opt(2012, 3, 14),
                };
                let total = store.total_revenue(single_day).await.unwrap();
                assert_close(total.revenue, 0.0);
            }

            #[tokio::test]
            async fn test_total_revenue_of_empty_store() {
                let store = $factory;
                let total = store.total_revenue(DateRange::default()).await.unwrap();
                assert_close(total.revenue, 0.0);
            }

            #[tokio::test]
            async fn test_item_revenue_ranking() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;

                let ranked = store.item_revenue(10).await.unwrap();
                let order: Vec<i64> = ranked.iter().map(|r| r.item.id).collect();
                assert_eq!(
                    order,
                    vec![c.qui_esse.id, c.autem.id, c.voluptatum.id, c.nemo.id, c.ring.id]
                );
                assert_close(ranked[0].revenue, 1502.14);
                assert_close(ranked[3].revenue, 173.08);

                let top_two = store.item_revenue(2).await.unwrap();
                assert_eq!(top_two.len(), 2);
            }

            #[tokio::test]
            async fn test_merchant_revenue_ranking() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;

                let ranked = store.merchant_revenue(10).await.unwrap();
                assert_eq!(ranked.len(), 2);
                assert_eq!(ranked[0].merchant, c.schroeder);
                assert_close(ranked[0].revenue, 2495.91);
                assert_eq!(ranked[1].merchant, c.klein);
                assert_close(ranked[1].revenue, 223.08);
            }

            #[tokio::test]
            async fn test_unshipped_revenue() {
                let store = $factory;
                let c = seed_catalogue(store.as_ref()).await;

                let ranked = store.unshipped_revenue(10).await.unwrap();
                let order: Vec<i64> = ranked.iter().map(|r| r.invoice_id).collect();
                assert_eq!(order, vec![c.invoices[2].id, c.invoices[4].id]);
                assert_close(ranked[0].potential_revenue, 323.01);
                assert_close(ranked[1].potential_revenue, 93.27);
            }

            #[tokio::test]
            async fn test_weekly_revenue() {
                let store = $factory;
                seed_catalogue(store.as_ref()).await;

                let weeks = store.weekly_revenue().await.unwrap();
                let starts: Vec<NaiveDate> = weeks.iter().map(|w| w.week).collect();
                assert_eq!(
                    starts,
                    vec![
                        NaiveDate::from_ymd_opt(2012, 3, 5).unwrap(),
                        NaiveDate::from_ymd_opt(2012, 3, 12).unwrap(),
                        NaiveDate::from_ymd_opt(2012, 3, 19).unwrap(),
                    ]
                );
                assert_close(weeks[0].revenue, 2302.71);
                assert_close(weeks[1].revenue, 323.01);
                assert_close(weeks[2].revenue, 93.27);
            }
        }
    };
}
