use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::warn;
use uuid::Uuid;

use crate::database::entities::photos;
use crate::report::{GpsPoint, PhotoView};

#[derive(Debug, Clone, Default)]
pub struct NewPhoto {
    pub report_id: String,
    pub filename: String,
    pub caption: String,
    pub taken_at: Option<DateTime<Utc>>,
    pub gps: Option<GpsPoint>,
    /// Set once the blob has landed in remote storage
    pub storage_path: String,
}

/// Photo records for a report. Blob contents live outside the store; rows
/// here carry captions, capture metadata, and the storage path used to
/// derive a public URL once uploaded.
#[derive(Clone)]
pub struct PhotoService {
    db: DatabaseConnection,
}

impl PhotoService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn add(&self, photo: NewPhoto) -> Result<photos::Model> {
        let uploaded = !photo.storage_path.is_empty();
        let model = photos::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            report_id: Set(photo.report_id),
            storage_path: Set(photo.storage_path),
            filename: Set(photo.filename),
            caption: Set(photo.caption),
            taken_at: Set(photo.taken_at),
            gps_lat: Set(photo.gps.as_ref().map(|g| g.lat)),
            gps_lng: Set(photo.gps.as_ref().map(|g| g.lng)),
            sync_status: Set(if uploaded { "uploaded" } else { "pending" }.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;
        Ok(model)
    }

    /// Rows for one report in capture order; empty on store errors.
    pub async fn for_report(&self, report_id: &str) -> Vec<photos::Model> {
        photos::Entity::find()
            .filter(photos::Column::ReportId.eq(report_id))
            .order_by_asc(photos::Column::CreatedAt)
            .all(&self.db)
            .await
            .unwrap_or_else(|err| {
                warn!("photo lookup for {report_id} failed: {err}");
                Vec::new()
            })
    }

    pub async fn update_caption(&self, photo_id: &str, caption: &str) -> Result<()> {
        if let Some(row) = photos::Entity::find_by_id(photo_id).one(&self.db).await? {
            let mut active: photos::ActiveModel = row.into();
            active.caption = Set(caption.to_string());
            active.update(&self.db).await?;
        }
        Ok(())
    }

    pub async fn delete(&self, photo_id: &str) -> Result<()> {
        photos::Entity::delete_by_id(photo_id).exec(&self.db).await?;
        Ok(())
    }

    /// Drop rows whose blobs never reached remote storage. Used by the
    /// post-submission cleanup to free device space.
    pub async fn delete_pending_for_report(&self, report_id: &str) -> Result<u64> {
        let result = photos::Entity::delete_many()
            .filter(photos::Column::ReportId.eq(report_id))
            .filter(photos::Column::SyncStatus.eq("pending"))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

/// Map a stored row to its display shape, deriving the public URL from the
/// configured storage base.
pub fn photo_view(row: &photos::Model, storage_base_url: &str) -> PhotoView {
    let url = if row.storage_path.is_empty() || storage_base_url.is_empty() {
        String::new()
    } else {
        format!(
            "{}/{}",
            storage_base_url.trim_end_matches('/'),
            row.storage_path
        )
    };
    PhotoView {
        id: row.id.clone(),
        url,
        storage_path: row.storage_path.clone(),
        file_name: row.filename.clone(),
        caption: row.caption.clone(),
        date: row
            .taken_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        time: row
            .taken_at
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_default(),
        gps: match (row.gps_lat, row.gps_lng) {
            (Some(lat), Some(lng)) => Some(GpsPoint { lat, lng }),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::services::report_service::tests::seed_report_header;

    #[tokio::test]
    async fn add_list_and_cleanup_pending() {
        let db = setup_test_db().await;
        seed_report_header(&db, "p1", "r1", "2026-03-02").await;
        let service = PhotoService::new(db);

        service
            .add(NewPhoto {
                report_id: "r1".to_string(),
                filename: "IMG_0001.jpg".to_string(),
                caption: "Footing excavation".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        service
            .add(NewPhoto {
                report_id: "r1".to_string(),
                filename: "IMG_0002.jpg".to_string(),
                storage_path: "2026/03/02/IMG_0002.jpg".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let rows = service.for_report("r1").await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sync_status, "pending");
        assert_eq!(rows[1].sync_status, "uploaded");

        let removed = service.delete_pending_for_report("r1").await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(service.for_report("r1").await.len(), 1);
    }

    #[test]
    fn view_derives_url_only_when_uploaded() {
        let row = photos::Model {
            id: "ph1".to_string(),
            report_id: "r1".to_string(),
            storage_path: "2026/03/02/a.jpg".to_string(),
            filename: "a.jpg".to_string(),
            caption: String::new(),
            taken_at: None,
            gps_lat: Some(29.95),
            gps_lng: Some(-90.07),
            sync_status: "uploaded".to_string(),
            created_at: Utc::now(),
        };
        let view = photo_view(&row, "https://cdn.example.com/report-photos/");
        assert_eq!(view.url, "https://cdn.example.com/report-photos/2026/03/02/a.jpg");
        assert_eq!(view.gps, Some(GpsPoint { lat: 29.95, lng: -90.07 }));

        let local = photos::Model {
            storage_path: String::new(),
            ..row
        };
        assert_eq!(photo_view(&local, "https://cdn.example.com").url, "");
    }
}
