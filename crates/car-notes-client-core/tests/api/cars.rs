use crate::helpers::{
    api_error, login, new_client, no_cb, spawn_app, spawn_logged_in_app, wait_for_logout,
    wait_for_settled, wait_until, TestApp, TestUser, PAGE_SIZE,
};
use car_notes_client_core::QueryState;
use car_notes_shared::{
    car::{Car, CarFields},
    const_config::path::{
        PATH_CARS_ADMIN_LIST, PATH_CARS_CREATE, PATH_CARS_DETAIL, PATH_CARS_FILTERS,
        PATH_CARS_LIST,
    },
    list_query::{CarListQuery, FilterKind},
    paginated::Paginated,
};
use std::sync::Arc;

fn ready<T: std::fmt::Debug>(state: QueryState<T>) -> Arc<T> {
    match state {
        QueryState::Ready(data) => data,
        other => panic!("expected query to be ready but got {other:?}"),
    }
}

fn add_cars(app: &TestApp, count: usize) -> Vec<Car> {
    (0..count)
        .map(|i| {
            app.backend.add_car(
                app.test_user.id,
                CarFields::new("Audi", format!("A{i}").as_str(), "Diesel"),
            )
        })
        .collect()
}

async fn read_cars(app: &TestApp, query: &CarListQuery) -> Arc<Paginated<Car>> {
    ready(wait_for_settled(|| app.core_client.cars(query, no_cb)).await)
}

#[tokio::test]
async fn list_served_from_cache() {
    // Arrange
    let app = spawn_logged_in_app().await;
    add_cars(&app, 2);
    let query = CarListQuery::new();

    // Act
    let first = read_cars(&app, &query).await;
    let second = ready(app.core_client.cars(&query, no_cb));

    // Assert
    assert_eq!(first.data.len(), 2);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(app.backend.request_count(&PATH_CARS_LIST, &[]), 1);
}

#[tokio::test]
async fn list_is_newest_first() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let cars = add_cars(&app, 3);

    // Act
    let page = read_cars(&app, &CarListQuery::new()).await;

    // Assert
    let ids: Vec<_> = page.data.iter().map(|x| x.id).collect();
    assert_eq!(ids, vec![cars[2].id, cars[1].id, cars[0].id]);
}

#[tokio::test]
async fn create_invalidates_list_which_refetches_once() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let query = CarListQuery::new();
    assert!(read_cars(&app, &query).await.data.is_empty());
    let fields = CarFields::new("BMW", "X5", "Petrol");

    // Act
    let saved = app
        .core_client
        .create_car(&fields, no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert - Stale data shown while the list is fetched again
    assert_eq!(saved, fields);
    let state = app.core_client.cars(&query, no_cb);
    assert!(state.is_fetching());
    for _ in 0..5 {
        let _ = app.core_client.cars(&query, no_cb);
    }
    let page = read_cars(&app, &query).await;
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].brand, "BMW");
    assert_eq!(app.backend.request_count(&PATH_CARS_LIST, &[]), 2);
    assert_eq!(app.backend.request_count(&PATH_CARS_CREATE, &[]), 1);
}

#[tokio::test]
async fn blank_field_rejected_by_server() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let fields = CarFields::new("", "X5", "Petrol");

    // Act
    let outcome = app.core_client.create_car(&fields, no_cb).await.unwrap();

    // Assert
    let err = outcome.unwrap_err();
    let api_error = api_error(&err);
    assert_eq!(api_error.status, 400);
    assert!(api_error.body.field("brand").is_some());
    assert_eq!(app.backend.car_count(), 0);
    assert!(app.core_client.is_logged_in());
}

#[tokio::test]
async fn second_page_requested_with_page_param() {
    // Arrange
    let app = spawn_logged_in_app().await;
    add_cars(&app, PAGE_SIZE as usize + 2);
    let mut query = CarListQuery::new();
    query.set_page(2);

    // Act
    let page = read_cars(&app, &query).await;

    // Assert
    assert_eq!(page.page, 2);
    assert_eq!(page.pages, 2);
    assert_eq!(page.count, u64::from(PAGE_SIZE) + 2);
    assert_eq!(page.data.len(), 2);
    let requests = app.backend.requests_to(&PATH_CARS_LIST, &[]);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query, "page=2");
}

#[tokio::test]
async fn page_past_end_answered_with_last_page() {
    // Arrange
    let app = spawn_logged_in_app().await;
    add_cars(&app, PAGE_SIZE as usize + 1);
    let mut query = CarListQuery::new();
    query.set_page(5);

    // Act
    let page = read_cars(&app, &query).await;

    // Assert
    assert_eq!(page.page, 2);
    assert_eq!(page.pages, 2);
    assert_eq!(page.data.len(), 1);
    assert!(app.core_client.is_logged_in());
}

#[tokio::test]
async fn filters_sent_and_applied() {
    // Arrange
    let app = spawn_logged_in_app().await;
    add_cars(&app, 2);
    app.backend.add_car(
        app.test_user.id,
        CarFields::new("BMW", "X5", "Petrol"),
    );
    app.backend.add_car(
        app.test_user.id,
        CarFields::new("Volvo", "XC60", "Electric"),
    );
    let mut query = CarListQuery::new();
    query.set_filter(FilterKind::Brand, "BMW", true);
    query.set_filter(FilterKind::Brand, "Volvo", true);

    // Act
    let page = read_cars(&app, &query).await;

    // Assert
    let mut brands: Vec<_> = page.data.iter().map(|x| x.brand.as_str()).collect();
    brands.sort();
    assert_eq!(brands, vec!["BMW", "Volvo"]);
    let requests = app.backend.requests_to(&PATH_CARS_LIST, &[]);
    assert_eq!(requests[0].query, "brand=BMW-Volvo&page=1");
}

#[tokio::test]
async fn different_filters_cached_separately() {
    // Arrange
    let app = spawn_logged_in_app().await;
    add_cars(&app, 1);
    let unfiltered = CarListQuery::new();
    let mut filtered = CarListQuery::new();
    filtered.set_filter(FilterKind::Motor, "Electric", true);

    // Act
    let all = read_cars(&app, &unfiltered).await;
    let electric = read_cars(&app, &filtered).await;

    // Assert
    assert_eq!(all.data.len(), 1);
    assert!(electric.data.is_empty());
    assert_eq!(app.backend.request_count(&PATH_CARS_LIST, &[]), 2);
}

#[tokio::test]
async fn filter_options_are_distinct_values() {
    // Arrange
    let app = spawn_logged_in_app().await;
    add_cars(&app, 3);
    app.backend.add_car(
        app.test_user.id,
        CarFields::new("BMW", "X5", "Petrol"),
    );

    // Act
    let options = ready(wait_for_settled(|| app.core_client.car_filter_options(no_cb)).await);

    // Assert
    assert_eq!(options.brands, vec!["Audi".to_string(), "BMW".to_string()]);
    assert_eq!(options.motors, vec!["Diesel".to_string(), "Petrol".to_string()]);
    assert_eq!(app.backend.request_count(&PATH_CARS_FILTERS, &[]), 1);
}

#[tokio::test]
async fn update_invalidates_detail_and_list() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let car = add_cars(&app, 1).remove(0);
    let id_param = car.id.to_string();
    let detail = ready(wait_for_settled(|| app.core_client.car(car.id, no_cb)).await);
    assert_eq!(detail.model, "A0");
    read_cars(&app, &CarListQuery::new()).await;
    let fields = CarFields::new("Audi", "A6", "Hybrid");

    // Act - The server answers without a body
    app.core_client
        .update_car(car.id, &fields, no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert
    let detail = ready(wait_for_settled(|| app.core_client.car(car.id, no_cb)).await);
    assert_eq!(detail.model, "A6");
    assert_eq!(detail.motor, "Hybrid");
    let page = read_cars(&app, &CarListQuery::new()).await;
    assert_eq!(page.data[0].model, "A6");
    assert_eq!(
        app.backend
            .request_count(&PATH_CARS_DETAIL, &[("id", id_param.as_str())]),
        2
    );
}

#[tokio::test]
async fn update_of_one_car_leaves_other_details_cached() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let cars = add_cars(&app, 2);
    let other_id = cars[1].id.to_string();
    wait_for_settled(|| app.core_client.car(cars[1].id, no_cb)).await;

    // Act
    app.core_client
        .update_car(cars[0].id, &CarFields::new("Audi", "A8", "Diesel"), no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert!(matches!(
        app.core_client.car(cars[1].id, no_cb),
        QueryState::Ready(_)
    ));
    assert_eq!(
        app.backend
            .request_count(&PATH_CARS_DETAIL, &[("id", other_id.as_str())]),
        1
    );
}

#[tokio::test]
async fn delete_removes_car_from_list() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let cars = add_cars(&app, 2);
    assert_eq!(read_cars(&app, &CarListQuery::new()).await.data.len(), 2);

    // Act
    app.core_client
        .delete_car(cars[0].id, no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert
    let page = read_cars(&app, &CarListQuery::new()).await;
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].id, cars[1].id);
    assert_eq!(app.backend.car_count(), 1);
}

#[tokio::test]
async fn car_of_another_user_not_found() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let other = TestUser::create(&app.backend, "other", false);
    let car = app
        .backend
        .add_car(other.id, CarFields::new("Audi", "A4", "Diesel"));

    // Act
    let state = wait_for_settled(|| app.core_client.car(car.id, no_cb)).await;
    let delete_outcome = app.core_client.delete_car(car.id, no_cb).await.unwrap();

    // Assert
    match state {
        QueryState::Failed(msg) => assert!(
            msg.contains("Car note with the given car id and user id does not exist"),
            "got: {msg}"
        ),
        other => panic!("expected failure but got {other:?}"),
    }
    assert_eq!(api_error(&delete_outcome.unwrap_err()).status, 404);
    assert_eq!(app.backend.car_count(), 1);
    assert!(app.core_client.is_logged_in());
}

#[tokio::test]
async fn admin_list_by_non_staff_ends_session() {
    // Arrange
    let app = spawn_logged_in_app().await;

    // Act
    let _ = app.core_client.cars_admin(&CarListQuery::new(), no_cb);

    // Assert
    wait_for_logout(&app.core_client).await;
    assert!(app.core_client.is_cache_empty());
    assert!(app.backend.request_count(&PATH_CARS_ADMIN_LIST, &[]) >= 1);
}

#[tokio::test]
async fn staff_sees_and_deletes_cars_of_all_users() {
    // Arrange
    let app = spawn_app().await;
    let staff = TestUser::create(&app.backend, "staff", true);
    login(&app.core_client, &staff).await;
    let own = app
        .backend
        .add_car(staff.id, CarFields::new("BMW", "X5", "Petrol"));
    let others = add_cars(&app, 2);
    let query = CarListQuery::new();

    // Act - The server sends every car as one array
    let page = ready(wait_for_settled(|| app.core_client.cars_admin(&query, no_cb)).await);

    // Assert
    assert_eq!(page.count, 3);
    assert_eq!(page.page_numbers().collect::<Vec<_>>(), vec![1]);
    let ids: Vec<_> = page.data.iter().map(|x| x.id).collect();
    assert_eq!(ids, vec![others[1].id, others[0].id, own.id]);

    // Act - Delete the car of another user
    app.core_client
        .delete_car_admin(others[0].id, no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert
    let page = ready(wait_for_settled(|| app.core_client.cars_admin(&query, no_cb)).await);
    assert_eq!(page.count, 2);
    assert_eq!(app.backend.car_count(), 2);
}

#[tokio::test]
async fn cars_not_shared_between_users() {
    // Arrange
    let app = spawn_logged_in_app().await;
    add_cars(&app, 2);
    let other_client = new_client(&app).await;
    let other = TestUser::create(&app.backend, "other", false);
    login(&other_client, &other).await;

    // Act
    let page = ready(wait_for_settled(|| other_client.cars(&CarListQuery::new(), no_cb)).await);

    // Assert
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn ui_notified_when_query_completes() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let (tx, rx) = std::sync::mpsc::channel();

    // Act
    let state = app.core_client.cars(&CarListQuery::new(), move || {
        tx.send(()).expect("receiver dropped");
    });

    // Assert
    assert!(matches!(state, QueryState::Loading));
    wait_until(|| rx.try_recv().ok())
        .await
        .expect("ui was not notified");
    assert!(matches!(
        app.core_client.cars(&CarListQuery::new(), no_cb),
        QueryState::Ready(_)
    ));
}
