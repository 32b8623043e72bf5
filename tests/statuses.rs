mod common;

use pretty_assertions::assert_eq;

use common::*;

#[actix_rt::test]
async fn test_status_crud() {
    let pool = test_pool().await;
    let albert = create_user(&pool, "albert").await;
    let app = init_app(&pool).await;

    let page = body_json(get(&app, "/statuses/create", Some(albert)).await).await;
    assert_eq!(page["form"]["fields"][0]["name"], "name");

    let resp = post(&app, "/statuses/create", Some(albert), &[("name", " New ")]).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/statuses");
    assert_eq!(notice(&resp).as_deref(), Some("success:status_created"));

    let page = body_json(get(&app, "/statuses", Some(albert)).await).await;
    assert_eq!(page["statuses"][0]["name"], "New");
    let id = page["statuses"][0]["id"].as_i64().unwrap();

    let resp = post(&app, "/statuses/create", Some(albert), &[("name", "New")]).await;
    assert_eq!(resp.status(), 422);
    let body = body_json(resp).await;
    assert_eq!(body["fields"]["name"][0], "Status with this name already exists.");

    let resp = post(&app, "/statuses/create", Some(albert), &[("name", "")]).await;
    assert_eq!(resp.status(), 422);

    let uri = format!("/statuses/{}/update", id);
    let page = body_json(get(&app, &uri, Some(albert)).await).await;
    assert_eq!(page["form"]["values"]["name"], "New");

    let resp = post(&app, &uri, Some(albert), &[("name", "In progress")]).await;
    assert_eq!(notice(&resp).as_deref(), Some("success:status_updated"));
    let page = body_json(get(&app, "/statuses", Some(albert)).await).await;
    assert_eq!(page["statuses"][0]["name"], "In progress");

    // Saving under the current name is not a conflict.
    let resp = post(&app, &uri, Some(albert), &[("name", "In progress")]).await;
    assert_eq!(resp.status(), 302);

    let resp = post(&app, &format!("/statuses/{}/delete", id), Some(albert), &[]).await;
    assert_eq!(notice(&resp).as_deref(), Some("success:status_deleted"));
    let page = body_json(get(&app, "/statuses", Some(albert)).await).await;
    assert_eq!(page["statuses"], serde_json::json!([]));
}

#[actix_rt::test]
async fn test_status_in_use_survives_delete() {
    let pool = test_pool().await;
    let albert = create_user(&pool, "albert").await;
    let new = create_status(&pool, "New").await;
    create_task(&pool, "T1", new, albert, None, vec![]).await;
    let app = init_app(&pool).await;

    let resp = get(&app, &format!("/statuses/{}/delete", new), Some(albert)).await;
    assert_eq!(resp.status(), 200);

    let resp = post(&app, &format!("/statuses/{}/delete", new), Some(albert), &[]).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/statuses");
    assert_eq!(notice(&resp).as_deref(), Some("error:status_in_use"));

    let page = body_json(get(&app, "/statuses", Some(albert)).await).await;
    assert_eq!(page["statuses"][0]["id"], new);
}

#[actix_rt::test]
async fn test_unknown_status_is_not_found() {
    let pool = test_pool().await;
    let albert = create_user(&pool, "albert").await;
    let app = init_app(&pool).await;

    assert_eq!(get(&app, "/statuses/42/update", Some(albert)).await.status(), 404);
    assert_eq!(
        post(&app, "/statuses/42/delete", Some(albert), &[]).await.status(),
        404
    );
    assert_eq!(get(&app, "/statuses/abc/update", Some(albert)).await.status(), 404);
}
