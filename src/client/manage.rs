//! Instance, group, chat and profile management. Thin passthrough calls.

use super::Client;
use crate::transport::ApiResponse;
use crate::Result;

impl Client {
    /// Create an instance. A `None` token lets the gateway generate one.
    pub async fn create_instance(
        &self,
        instance_name: &str,
        token: Option<&str>,
        qrcode: bool,
    ) -> Result<ApiResponse> {
        self.execute(&self.endpoints.create_instance(instance_name, token, qrcode))
            .await
    }

    /// Start pairing; the body carries the QR code (`base64`) or pairing code.
    pub async fn connect_instance(&self, instance_name: &str) -> Result<ApiResponse> {
        self.execute(&self.endpoints.connect_instance(instance_name))
            .await
    }

    pub async fn connection_state(&self, instance_name: &str) -> Result<ApiResponse> {
        self.execute(&self.endpoints.connection_state(instance_name))
            .await
    }

    pub async fn logout_instance(&self, instance_name: &str) -> Result<ApiResponse> {
        self.execute(&self.endpoints.logout_instance(instance_name))
            .await
    }

    pub async fn delete_instance(&self, instance_name: &str) -> Result<ApiResponse> {
        self.execute(&self.endpoints.delete_instance(instance_name))
            .await
    }

    pub async fn fetch_instances(&self) -> Result<ApiResponse> {
        self.execute(&self.endpoints.fetch_instances()).await
    }

    pub async fn group_create(
        &self,
        subject: &str,
        participants: &[String],
        description: Option<&str>,
        instance: Option<&str>,
    ) -> Result<ApiResponse> {
        self.execute(
            &self
                .endpoints
                .group_create(subject, participants, description, instance),
        )
        .await
    }

    pub async fn group_update_picture(
        &self,
        group_jid: &str,
        image_url: &str,
        instance: Option<&str>,
    ) -> Result<ApiResponse> {
        self.execute(
            &self
                .endpoints
                .group_update_picture(group_jid, image_url, instance),
        )
        .await
    }

    pub async fn group_fetch_all(
        &self,
        get_participants: bool,
        instance: Option<&str>,
    ) -> Result<ApiResponse> {
        self.execute(&self.endpoints.group_fetch_all(get_participants, instance))
            .await
    }

    pub async fn group_participants_update(
        &self,
        group_jid: &str,
        action: &str,
        participants: &[String],
        instance: Option<&str>,
    ) -> Result<ApiResponse> {
        self.execute(
            &self
                .endpoints
                .group_participants_update(group_jid, action, participants, instance),
        )
        .await
    }

    pub async fn chat_archive(
        &self,
        number: &str,
        archive: bool,
        instance: Option<&str>,
    ) -> Result<ApiResponse> {
        self.execute(&self.endpoints.chat_archive(number, archive, instance))
            .await
    }

    pub async fn chat_mark_read(
        &self,
        number: &str,
        read: bool,
        instance: Option<&str>,
    ) -> Result<ApiResponse> {
        self.execute(&self.endpoints.chat_mark_read(number, read, instance))
            .await
    }

    pub async fn profile_update_name(&self, name: &str, instance: Option<&str>) -> Result<ApiResponse> {
        self.execute(&self.endpoints.profile_update_name(name, instance))
            .await
    }

    pub async fn profile_update_status(
        &self,
        status: &str,
        instance: Option<&str>,
    ) -> Result<ApiResponse> {
        self.execute(&self.endpoints.profile_update_status(status, instance))
            .await
    }
}
