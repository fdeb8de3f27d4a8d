//! Containerd payloads.

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdDumpArgs {
    #[prost(string, tag = "1")]
    pub container_id: String,
    #[prost(string, tag = "2")]
    pub namespace: String,
    /// Image reference to commit the checkpoint under.
    #[prost(string, tag = "3")]
    pub r#ref: String,
    #[prost(string, tag = "4")]
    pub address: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdDumpResp {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(string, tag = "2")]
    pub checkpoint_path: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdRestoreArgs {
    #[prost(string, tag = "1")]
    pub image_ref: String,
    #[prost(string, tag = "2")]
    pub container_id: String,
    #[prost(string, tag = "3")]
    pub namespace: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdRestoreResp {
    #[prost(string, tag = "1")]
    pub message: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdQueryArgs {
    #[prost(string, tag = "1")]
    pub namespace: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdContainer {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub image: String,
    #[prost(string, tag = "3")]
    pub runtime: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdQueryResp {
    #[prost(message, repeated, tag = "1")]
    pub containers: Vec<ContainerdContainer>,
}

/// Dump a container's root filesystem into a new image.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdRootfsDumpArgs {
    #[prost(string, tag = "1")]
    pub container_id: String,
    #[prost(string, tag = "2")]
    pub image_ref: String,
    #[prost(string, tag = "3")]
    pub address: String,
    #[prost(string, tag = "4")]
    pub namespace: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdRootfsDumpResp {
    #[prost(string, tag = "1")]
    pub image_ref: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdRootfsRestoreArgs {
    #[prost(string, tag = "1")]
    pub container_id: String,
    #[prost(string, tag = "2")]
    pub image_ref: String,
    #[prost(string, tag = "3")]
    pub address: String,
    #[prost(string, tag = "4")]
    pub namespace: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerdRootfsRestoreResp {
    #[prost(string, tag = "1")]
    pub image_ref: String,
}
